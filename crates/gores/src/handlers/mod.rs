//! Request handlers and the state they share.

mod account;
mod booking;
mod calendar;

use anyhow::Result as AnyResult;
use gores_core::auth::USERNAME_KEY;
use gores_core::gateway::{RequestContext, Response, Router};
use gores_core::{Database, Error, Result};
use serde::Serialize;

use crate::config::Config;
use crate::templates::Templates;

/// Session key of the one-shot message shown on the next page.
pub const MESSAGE_KEY: &str = "message";

/// Application state handed to every handler.
pub struct App {
    pub db: Database,
    pub config: Config,
    pub templates: Templates,
}

impl App {
    pub fn new(db: Database, config: Config) -> AnyResult<Self> {
        let templates = Templates::new()?;
        Ok(Self { db, config, templates })
    }

    /// Render a template, mapping template failures to internal errors.
    pub fn render<C: Serialize>(&self, name: &str, ctx: C) -> Result<String> {
        self.templates
            .render(name, ctx)
            .map_err(|e| Error::Other(format!("rendering {name}: {e}")))
    }

    pub fn is_admin(&self, user: &str) -> bool {
        self.config
            .booking
            .admin_users
            .iter()
            .any(|admin| admin.eq_ignore_ascii_case(user))
    }
}

/// All routes served by gores.
pub fn router() -> Router<App> {
    let mut router = Router::new();
    router
        .add_handler("/login", account::show_login)
        .add_handler("/dologin", account::do_login)
        .add_handler("/logout", account::do_logout)
        .add_handler("/main", calendar::show_main)
        .add_handler("/doSave", booking::do_save)
        .add_handler("/doDelete", booking::do_delete);
    router
}

/// The logged-in user, or `None` after queueing a redirect to the login page.
fn require_user(ctx: &RequestContext<'_, App>, response: &mut Response) -> Option<String> {
    let username = ctx.session.get(USERNAME_KEY);
    if username.is_empty() {
        response.redirect("/login");
        None
    } else {
        Some(username.to_string())
    }
}

/// `/main` target for a month, falling back to the current month when
/// `month` or `year` are not numbers.
fn main_target(month: &str, year: &str) -> String {
    match (month.trim().parse::<u32>(), year.trim().parse::<i32>()) {
        (Ok(m), Ok(y)) => format!("/main?m={m}&y={y}"),
        _ => "/main".to_string(),
    }
}


#[cfg(test)]
mod tests {
    use super::booking::{CONFLICT_MESSAGE, FORBIDDEN_MESSAGE, NOT_FOUND_MESSAGE};
    use super::*;
    use gores_core::db::User;
    use gores_core::gateway::{CgiEnvironment, Gateway};
    use gores_core::session::{parse_cookie_header, SessionStore, SESSION_COOKIE};

    const ROOT: &str = "/cgi-bin/gores";

    struct Harness {
        app: App,
    }

    impl Harness {
        fn new() -> Self {
            let db = Database::open_in_memory().unwrap();
            for name in ["anna", "bert", "frank"] {
                db.upsert_user(&User {
                    name: name.into(),
                    email: format!("{name}@example.org"),
                    phone: String::new(),
                    password: format!("{name}-pw"),
                })
                .unwrap();
            }
            let mut config = Config::default();
            config.booking.admin_users = vec!["frank".into()];
            Self {
                app: App::new(db, config).unwrap(),
            }
        }

        fn request(&self, path: &str, query: &str, body: &str, cookie: &str) -> String {
            let sessions = SessionStore::new(&self.app.db);
            let gateway = Gateway::new(router(), ROOT);
            let env = CgiEnvironment {
                path_info: path.into(),
                query_string: query.into(),
                content_length: (!body.is_empty()).then(|| body.len().to_string()),
                http_cookie: cookie.into(),
            };
            let mut out = Vec::new();
            gateway
                .handle(&self.app, &sessions, &env, body.as_bytes(), &mut out)
                .unwrap();
            String::from_utf8(out).unwrap()
        }

        /// Log in and return the cookie header for follow-up requests.
        fn login(&self, name: &str) -> String {
            let body = format!("username={name}&password={name}-pw");
            let text = self.request("/dologin", "", &body, "");
            assert!(text.contains(&format!("Location: {ROOT}/main\n")), "{text}");
            let sid = text
                .lines()
                .find_map(|l| l.strip_prefix("Set-Cookie: "))
                .and_then(|c| parse_cookie_header(c).remove(SESSION_COOKIE))
                .unwrap();
            format!("{SESSION_COOKIE}={sid}")
        }

        fn save(&self, cookie: &str, begin: (u32, u32), end: (u32, u32)) -> String {
            let body = format!(
                "byear=2024&bmonth={}&bday={}&end_year=2024&end_month={}&end_day={}&bemerkung=Ferien&m=3&y=2024",
                begin.0, begin.1, end.0, end.1
            );
            self.request("/doSave", "", &body, cookie)
        }
    }

    #[test]
    fn test_login_page() {
        let h = Harness::new();
        let text = h.request("/login", "", "", "");
        assert!(text.starts_with("Status: 200 OK\n"));
        assert!(text.contains(r#"action="/cgi-bin/gores/dologin""#));
    }

    #[test]
    fn test_wrong_password_is_401() {
        let h = Harness::new();
        let text = h.request("/dologin", "", "username=anna&password=nope", "");
        assert!(text.starts_with("Status: 401 Unauthorized\n"));
        assert!(text.ends_with("\n\ninvalid username or password\n"));

        let text = h.request("/dologin", "", "username=nobody&password=x", "");
        assert!(text.starts_with("Status: 401 Unauthorized\n"));
    }

    #[test]
    fn test_password_whitespace_is_ignored() {
        let h = Harness::new();
        let text = h.request("/dologin", "", "username=anna&password=+anna-pw+", "");
        assert!(text.contains("Location: /cgi-bin/gores/main\n"));
    }

    #[test]
    fn test_pages_require_login() {
        let h = Harness::new();
        for path in ["/main", "/doSave", "/doDelete"] {
            let text = h.request(path, "", "", "");
            assert!(text.contains("Location: /cgi-bin/gores/login\n"), "{path}: {text}");
        }
    }

    #[test]
    fn test_main_renders_requested_month() {
        let h = Harness::new();
        let cookie = h.login("anna");

        let text = h.request("/main", "m=3&y=2024", "", &cookie);
        assert!(text.starts_with("Status: 200 OK\n"));
        assert!(text.contains("März 2024"));
        assert!(text.contains("Angemeldet als <b>anna</b>"));
        assert!(text.contains(r#"href="/cgi-bin/gores/main?m=2&amp;y=2024""#));
        assert!(text.contains(r#"href="/cgi-bin/gores/main?m=4&amp;y=2024""#));
        assert_eq!(text.matches(r#"<td class="rightmonth""#).count(), 30);
        assert_eq!(text.matches(r#"<td class="wrongmonth""#).count(), 5);
    }

    #[test]
    fn test_main_rejects_bad_month() {
        let h = Harness::new();
        let cookie = h.login("anna");
        let text = h.request("/main", "m=13&y=2024", "", &cookie);
        assert!(text.starts_with("Status: 400 Bad Request\n"));
    }

    #[test]
    fn test_save_then_conflict_flash() {
        let h = Harness::new();
        let anna = h.login("anna");
        let bert = h.login("bert");

        let text = h.save(&anna, (3, 10), (3, 12));
        assert!(text.contains("Location: /cgi-bin/gores/main?m=3&y=2024\n"));

        let page = h.request("/main", "m=3&y=2024", "", &anna);
        assert_eq!(page.matches(r#"<td class="eig_res_rightmonth""#).count(), 3);
        assert!(!page.contains(CONFLICT_MESSAGE));

        // Sharing the boundary day conflicts
        let text = h.save(&bert, (3, 12), (3, 14));
        assert!(text.contains("Location: /cgi-bin/gores/main?m=3&y=2024\n"));

        let page = h.request("/main", "m=3&y=2024", "", &bert);
        assert!(page.contains(CONFLICT_MESSAGE));
        assert_eq!(page.matches(r#"<td class="res_rightmonth""#).count(), 3);

        // Shown once
        let page = h.request("/main", "m=3&y=2024", "", &bert);
        assert!(!page.contains(CONFLICT_MESSAGE));

        assert_eq!(
            h.app
                .db
                .list_bookings_between(
                    chrono::NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
                    chrono::NaiveDate::from_ymd_opt(2024, 3, 31).unwrap()
                )
                .unwrap()
                .len(),
            1
        );
    }

    #[test]
    fn test_save_with_invalid_date_flashes() {
        let h = Harness::new();
        let anna = h.login("anna");
        let text = h.save(&anna, (2, 30), (3, 1));
        assert!(text.contains("Location: /cgi-bin/gores/main?m=3&y=2024\n"));

        let page = h.request("/main", "m=3&y=2024", "", &anna);
        assert!(page.contains("Etwas ist beim Speichern schiefgelaufen..."));
    }

    #[test]
    fn test_save_rejects_far_future_end() {
        let h = Harness::new();
        let anna = h.login("anna");
        let bert = h.login("bert");

        let body = "byear=2024&bmonth=3&bday=1&end_year=10000&end_month=1&end_day=1&bemerkung=&m=3&y=2024";
        let text = h.request("/doSave", "", body, &anna);
        assert!(text.contains("Location: /cgi-bin/gores/main?m=3&y=2024\n"));
        let page = h.request("/main", "m=3&y=2024", "", &anna);
        assert!(page.contains("Etwas ist beim Speichern schiefgelaufen..."));

        // Nothing was stored, so a later booking in March is free
        h.save(&bert, (3, 10), (3, 12));
        let page = h.request("/main", "m=3&y=2024", "", &bert);
        assert!(!page.contains(CONFLICT_MESSAGE));
        assert_eq!(page.matches(r#"<td class="eig_res_rightmonth""#).count(), 3);
    }

    #[test]
    fn test_delete_permissions() {
        let h = Harness::new();
        let anna = h.login("anna");
        let bert = h.login("bert");
        let frank = h.login("frank");
        h.save(&anna, (3, 10), (3, 12));
        h.save(&anna, (3, 20), (3, 21));

        let text = h.request("/doDelete", "id=1&m=3&y=2024", "", &bert);
        assert!(text.contains("Location: /cgi-bin/gores/main?m=3&y=2024\n"));
        let page = h.request("/main", "m=3&y=2024", "", &bert);
        assert!(page.contains(FORBIDDEN_MESSAGE));
        assert!(h.app.db.get_booking(1).unwrap().is_some());

        h.request("/doDelete", "id=1&m=3&y=2024", "", &anna);
        assert!(h.app.db.get_booking(1).unwrap().is_none());

        h.request("/doDelete", "id=2&m=3&y=2024", "", &frank);
        assert!(h.app.db.get_booking(2).unwrap().is_none());

        h.request("/doDelete", "id=2&m=3&y=2024", "", &frank);
        let page = h.request("/main", "m=3&y=2024", "", &frank);
        assert!(page.contains(NOT_FOUND_MESSAGE));
    }

    #[test]
    fn test_delete_with_bad_id_is_400() {
        let h = Harness::new();
        let anna = h.login("anna");
        let text = h.request("/doDelete", "id=abc&m=3&y=2024", "", &anna);
        assert!(text.starts_with("Status: 400 Bad Request\n"));
    }

    #[test]
    fn test_logout_ends_session() {
        let h = Harness::new();
        let anna = h.login("anna");

        let text = h.request("/logout", "", "", &anna);
        assert!(text.contains("Location: /cgi-bin/gores/login\n"));

        let text = h.request("/main", "m=3&y=2024", "", &anna);
        assert!(text.contains("Location: /cgi-bin/gores/login\n"));
    }

    #[test]
    fn test_main_target() {
        assert_eq!(main_target("3", "2024"), "/main?m=3&y=2024");
        assert_eq!(main_target("3", ""), "/main");
        assert_eq!(main_target("3\r\nX-Evil: 1", "2024"), "/main");
    }
}
