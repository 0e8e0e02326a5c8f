use std::path::Path;
use serde::Serialize;
use tera::{Context, Tera};

#[derive(Debug)]
pub enum TemplateError {
    NotFound(String),
    TeraError(tera::Error),
    IoError(std::io::Error),
}

impl From<tera::Error> for TemplateError {
    fn from(err: tera::Error) -> Self {
        TemplateError::TeraError(err)
    }
}

impl From<std::io::Error> for TemplateError {
    fn from(err: std::io::Error) -> Self {
        TemplateError::IoError(err)
    }
}

impl std::fmt::Display for TemplateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TemplateError::NotFound(name) => write!(f, "Template not found: {}", name),
            TemplateError::TeraError(e) => write!(f, "Template error: {}", e),
            TemplateError::IoError(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for TemplateError {}

/// Tera templates loaded from one directory, plus a context shared by every
/// render.
pub struct TemplateRenderer {
    tera: Tera,
    context: Context,
}

impl TemplateRenderer {
    /// Loads every file under `templates_dir`. Template names are paths
    /// relative to that directory, e.g. `blog_show.html`.
    pub fn new(templates_dir: &Path) -> Result<Self, TemplateError> {
        if !templates_dir.is_dir() {
            return Err(TemplateError::IoError(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("templates directory {} does not exist", templates_dir.display()),
            )));
        }

        let glob = format!("{}/**/*", templates_dir.display());
        let tera = Tera::new(&glob)?;
        let context = Context::new();

        Ok(Self { tera, context })
    }

    /// Add a value to the context every render sees
    pub fn add_to_context<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) {
        self.context.insert(key, value);
    }

    pub fn has_template(&self, name: &str) -> bool {
        self.tera.get_template_names().any(|t| t == name)
    }

    /// Render a template with `context` layered over the shared context
    pub fn render(&self, template: &str, context: &Context) -> Result<String, TemplateError> {
        if !self.has_template(template) {
            return Err(TemplateError::NotFound(template.to_string()));
        }

        let mut merged = self.context.clone();
        merged.extend(context.clone());
        Ok(self.tera.render(template, &merged)?)
    }
}
