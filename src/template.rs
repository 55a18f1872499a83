//! # Templates
//! src/template.rs
//!
//! Sustitución mínima de variables `{{nombre}}` en archivos HTML.
//!
//! - Los espacios alrededor del nombre se ignoran (`{{ title }}`).
//! - Una variable desconocida se reemplaza por un string vacío.
//! - Un `{{` sin `}}` de cierre se copia como texto literal.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errores al renderizar un archivo
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("failed to load template {path}: {source}")]
    Load {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Variables disponibles para un render, en orden de inserción
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateContext {
    variables: Vec<(String, String)>,
}

impl TemplateContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Define una variable; si ya existe se sobrescribe su valor
    pub fn set(&mut self, name: &str, value: &str) -> &mut Self {
        match self.variables.iter_mut().find(|(existing, _)| existing == name) {
            Some((_, existing_value)) => *existing_value = value.to_string(),
            None => self.variables.push((name.to_string(), value.to_string())),
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.variables
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }
}

/// Renderiza un template en memoria
///
/// # Ejemplo
/// ```
/// use ternic_server::template::{render_str, TemplateContext};
///
/// let mut ctx = TemplateContext::new();
/// ctx.set("name", "Ternic");
///
/// assert_eq!(render_str("Hola {{ name }}!{{missing}}", &ctx), "Hola Ternic!");
/// assert_eq!(render_str("abierto {{name", &ctx), "abierto {{name");
/// ```
pub fn render_str(template: &str, ctx: &TemplateContext) -> String {
    let mut output = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        output.push_str(&rest[..start]);
        let after_open = &rest[start + 2..];

        match after_open.find("}}") {
            Some(end) => {
                let name = after_open[..end].trim();
                output.push_str(ctx.get(name).unwrap_or(""));
                rest = &after_open[end + 2..];
            }
            None => {
                // Sin cierre: el resto es texto literal
                output.push_str(&rest[start..]);
                return output;
            }
        }
    }

    output.push_str(rest);
    output
}

/// Carga templates desde un directorio raíz
#[derive(Debug, Clone)]
pub struct TemplateEngine {
    root: PathBuf,
}

impl TemplateEngine {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Carga `root/name` y lo renderiza con `ctx`
    pub fn render(&self, name: &str, ctx: &TemplateContext) -> Result<String, TemplateError> {
        let path = self.root.join(name);
        let source = fs::read_to_string(&path).map_err(|source| TemplateError::Load {
            path: path.clone(),
            source,
        })?;
        Ok(render_str(&source, ctx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(pairs: &[(&str, &str)]) -> TemplateContext {
        let mut ctx = TemplateContext::new();
        for (name, value) in pairs {
            ctx.set(name, value);
        }
        ctx
    }

    #[test]
    fn test_substitutes_variables() {
        let ctx = ctx(&[("title", "Inicio"), ("code", "404")]);
        assert_eq!(
            render_str("<h1>{{title}}</h1><p>{{ code }}</p>", &ctx),
            "<h1>Inicio</h1><p>404</p>"
        );
    }

    #[test]
    fn test_unknown_variable_renders_empty() {
        assert_eq!(render_str("a{{nope}}b", &TemplateContext::new()), "ab");
    }

    #[test]
    fn test_unterminated_marker_is_literal() {
        let ctx = ctx(&[("x", "1")]);
        assert_eq!(render_str("{{x}} and {{x", &ctx), "1 and {{x");
    }

    #[test]
    fn test_single_braces_untouched() {
        let ctx = ctx(&[("x", "1")]);
        assert_eq!(render_str("fn() { {x} }", &ctx), "fn() { {x} }");
    }

    #[test]
    fn test_value_is_not_rendered_again() {
        let ctx = ctx(&[("a", "{{b}}"), ("b", "nope")]);
        assert_eq!(render_str("{{a}}", &ctx), "{{b}}");
    }

    #[test]
    fn test_set_overwrites() {
        let mut ctx = TemplateContext::new();
        ctx.set("k", "1").set("k", "2");
        assert_eq!(ctx.len(), 1);
        assert_eq!(ctx.get("k"), Some("2"));
    }

    #[test]
    fn test_engine_renders_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("page.html"), "<p>{{msg}}</p>").unwrap();

        let engine = TemplateEngine::new(dir.path());
        let rendered = engine.render("page.html", &ctx(&[("msg", "ok")])).unwrap();
        assert_eq!(rendered, "<p>ok</p>");
    }

    #[test]
    fn test_engine_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let engine = TemplateEngine::new(dir.path());
        assert!(matches!(
            engine.render("missing.html", &TemplateContext::new()),
            Err(TemplateError::Load { .. })
        ));
    }
}
