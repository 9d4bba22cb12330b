use handlebars::Handlebars;
use std::sync::Arc;

pub type Hbs = Arc<Handlebars<'static>>;

const TEMPLATES: &[(&str, &str)] = &[
    ("layouts/base", "templates/layouts/base.hbs"),
    ("pages/index", "templates/pages/index.hbs"),
    ("pages/not_found", "templates/pages/not_found.hbs"),
    ("pages/apology", "templates/pages/apology.hbs"),
    ("pages/login", "templates/pages/login.hbs"),
    ("pages/register", "templates/pages/register.hbs"),
    ("pages/password", "templates/pages/password.hbs"),
    ("pages/quote", "templates/pages/quote.hbs"),
    ("pages/quoted", "templates/pages/quoted.hbs"),
    ("pages/buy", "templates/pages/buy.hbs"),
    ("pages/sell", "templates/pages/sell.hbs"),
    ("pages/history", "templates/pages/history.hbs"),
];

const PARTIALS: &[(&str, &str)] = &[
    ("navbar", "templates/partials/navbar.hbs"),
    ("footer", "templates/partials/footer.hbs"),
    ("flash", "templates/partials/flash.hbs"),
];

pub fn build_handlebars() -> Result<Hbs, String> {
    let mut hb = Handlebars::new();
    hb.set_strict_mode(false);

    for (name, path) in TEMPLATES {
        hb.register_template_file(name, path)
            .map_err(|e| format!("template {name}: {e}"))?;
    }

    for (name, path) in PARTIALS {
        let src = std::fs::read_to_string(path).map_err(|e| format!("{path}: {e}"))?;
        hb.register_partial(name, src)
            .map_err(|e| format!("partial {name}: {e}"))?;
    }

    Ok(Arc::new(hb))
}
