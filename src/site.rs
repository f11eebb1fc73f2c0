// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! 服务端自带的示例站点。

use webrouter::{
    Action, ActionResult, Application, Args, Config, Context, Controller, Exception, FsStatic,
    Halt, HandlerRef, Params,
};

#[derive(Default)]
pub struct Home;

impl Home {
    fn index(&mut self, ctx: &mut Context<'_>, _args: &Args) -> ActionResult {
        let about = ctx.path_for(HandlerRef::of::<Home>("about"), &Params::new())?;
        let articles = ctx.path_for(HandlerRef::of::<Articles>("index"), &Params::new())?;
        Ok(format!(
            "<h1>webrouter</h1><ul><li><a href=\"{}\">about</a></li><li><a href=\"{}\">articles</a></li></ul>",
            about, articles
        ))
    }

    fn about(&mut self, _ctx: &mut Context<'_>, _args: &Args) -> ActionResult {
        Ok("<h1>About</h1><p>A small routing engine.</p>".to_string())
    }

    fn legacy(&mut self, ctx: &mut Context<'_>, _args: &Args) -> ActionResult {
        let target = ctx.path_for(HandlerRef::of::<Home>("about"), &Params::new())?;
        Err(Halt::redirect(&target).into())
    }
}

impl Controller for Home {
    const NAME: &'static str = "home";

    fn actions() -> Vec<Action<Self>> {
        vec![
            Action::new("index", &[], Self::index),
            Action::new("about", &[], Self::about),
            Action::new("legacy", &[], Self::legacy),
        ]
    }
}

const TITLES: [&str; 3] = ["Hello", "Routing", "Dispatch"];

#[derive(Default)]
pub struct Articles;

impl Articles {
    fn index(&mut self, ctx: &mut Context<'_>, _args: &Args) -> ActionResult {
        let page: usize = ctx.query("page").unwrap_or("1").parse()?;
        let mut items = String::new();
        for id in 1..=TITLES.len() {
            let id_text = id.to_string();
            let link =
                ctx.path_for_positional(HandlerRef::of::<Articles>("show"), &[id_text.as_str()])?;
            items.push_str(&format!("<li><a href=\"{}\">{}</a></li>", link, TITLES[id - 1]));
        }
        Ok(format!("<h1>Articles (page {})</h1><ul>{}</ul>", page, items))
    }

    fn show(&mut self, ctx: &mut Context<'_>, args: &Args) -> ActionResult {
        // 非数字的 id 与不存在的文章一样返回 404
        let id: usize = args.get("id").and_then(|v| v.parse().ok()).unwrap_or_default();
        let title = match id.checked_sub(1).and_then(|i| TITLES.get(i)) {
            Some(title) => title,
            None => return Err(Halt::status(404).into()),
        };
        if ctx.query("format") == Some("json") {
            ctx.set_content_type("application/json");
            return Ok(serde_json::json!({ "id": id, "title": title }).to_string());
        }
        Ok(format!("<h1>{}</h1>", title))
    }

    fn create(&mut self, ctx: &mut Context<'_>, _args: &Args) -> ActionResult {
        if ctx.request().body().is_empty() {
            return Err(Halt::status(422).with_body("<h1>Empty article</h1>").into());
        }
        let mut args = Params::new();
        args.insert("id".to_string(), (TITLES.len() + 1).to_string());
        let location = ctx.path_for(HandlerRef::of::<Articles>("show"), &args)?;
        ctx.set_status(201).set_header("Location", &location);
        Ok(String::new())
    }

    fn archive(&mut self, _ctx: &mut Context<'_>, args: &Args) -> ActionResult {
        let year: u32 = args.parse("year")?.unwrap_or_default();
        match args.parse::<u8>("month")? {
            Some(month) if (1..=12).contains(&month) => {
                Ok(format!("<h1>Archive {}-{:02}</h1>", year, month))
            }
            Some(_) => Err(Halt::status(400).into()),
            None => Ok(format!("<h1>Archive {}</h1>", year)),
        }
    }

    fn attachment(&mut self, _ctx: &mut Context<'_>, args: &Args) -> ActionResult {
        Ok(format!("<h1>Attachment</h1><p>{}</p>", args.get("path").unwrap_or_default()))
    }
}

impl Controller for Articles {
    const NAME: &'static str = "articles";

    fn actions() -> Vec<Action<Self>> {
        vec![
            Action::new("index", &[], Self::index),
            Action::new("show", &["id"], Self::show),
            Action::new("create", &[], Self::create),
            Action::new("archive", &["year", "month"], Self::archive),
            Action::new("attachment", &["path"], Self::attachment),
        ]
    }

    fn default_body(status: u16) -> Option<String> {
        (status == 404).then(|| "<h1>No such article</h1>".to_string())
    }
}

pub fn application(config: &Config) -> Result<Application, Exception> {
    Application::builder()
        .mount::<Home, _>("/", |s| {
            s.get("/", "index").get("/about", "about").get("/about.php", "legacy");
        })
        .mount::<Articles, _>("/articles", |s| {
            s.get("/", "index")
                .post("/", "create")
                .get("/:id", "show")
                .scope("/archive", |s| {
                    s.get("/:year/:month?", "archive");
                })
                .get("/files/*path", "attachment");
        })
        .public_root(FsStatic::new(config.public_root(), config.cache_size()))
        .shared_root(FsStatic::new(config.shared_root(), config.cache_size()))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use webrouter::{HttpRequestMethod, Request, Response};

    fn get(target: &str) -> Response {
        let app = application(&Config::new()).unwrap();
        app.call(&Request::new(HttpRequestMethod::Get, target))
    }

    #[test]
    fn test_home_links() {
        let body = get("/").body_text();
        assert!(body.contains("href=\"/about\""));
        assert!(body.contains("href=\"/articles\""));
        assert_eq!(get("/about.php").header("Location"), Some("/about"));
    }

    #[test]
    fn test_articles() {
        assert!(get("/articles").body_text().contains("href=\"/articles/3\""));
        assert_eq!(get("/articles/2").body_text(), "<h1>Routing</h1>");
        assert_eq!(get("/articles/2?format=json").header("Content-Type"), Some("application/json"));

        let missing = get("/articles/abc");
        assert_eq!(missing.status_code(), 404);
        assert_eq!(missing.body_text(), "<h1>No such article</h1>");
    }

    #[test]
    fn test_archive_optional_month() {
        assert_eq!(get("/articles/archive/2024").body_text(), "<h1>Archive 2024</h1>");
        assert_eq!(get("/articles/archive/2024/5").body_text(), "<h1>Archive 2024-05</h1>");
        assert_eq!(get("/articles/archive/2024/13").status_code(), 400);
    }

    #[test]
    fn test_attachment_trailing_path() {
        assert_eq!(
            get("/articles/files/docs/a%20b.txt").body_text(),
            "<h1>Attachment</h1><p>docs/a b.txt</p>"
        );
    }
}
