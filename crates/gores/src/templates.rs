//! Page templates, compiled into the binary.

use minijinja::Environment;
use serde::Serialize;

pub const MAIN: &str = "main.html";
pub const LOGIN: &str = "login.html";

/// The template environment. `.html` names are auto-escaped.
pub struct Templates {
    env: Environment<'static>,
}

impl Templates {
    pub fn new() -> Result<Self, minijinja::Error> {
        let mut env = Environment::new();
        env.add_template("layout.html", include_str!("../templates/layout.html"))?;
        env.add_template(MAIN, include_str!("../templates/main.html"))?;
        env.add_template(LOGIN, include_str!("../templates/login.html"))?;
        Ok(Self { env })
    }

    pub fn render<C: Serialize>(&self, name: &str, ctx: C) -> Result<String, minijinja::Error> {
        self.env.get_template(name)?.render(ctx)
    }
}
