//! Template rendering
//!
//! Templates use Jinja syntax (via `minijinja`) with a small function set
//! injected into every render:
//!
//! | Function             | Result                                              |
//! |----------------------|-----------------------------------------------------|
//! | `lookupHost(name)`   | sorted address list, empty if the lookup fails      |
//! | `add`, `mul`, `div`  | integer arithmetic (division by zero is an error)   |
//! | `addf`, `mulf`, `divf` | float arithmetic                                  |
//!
//! ```jinja
//! {% for ip in lookupHost("svc.internal") -%}
//! server backend{{ loop.index }} {{ ip }}:8080 weight {{ mul(loop.index, 10) }}
//! {% endfor %}
//! ```
//!
//! The template file is read again on every render so edits take effect on
//! the next reaction.

use minijinja::{Environment, ErrorKind, context};
use std::path::Path;
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::debug;

use crate::error::{Error, Result};
use crate::traits::Resolver;

/// Renders template files with the injected function set
#[derive(Clone)]
pub struct TemplateRenderer {
    resolver: Arc<dyn Resolver>,
}

impl TemplateRenderer {
    /// Create a renderer whose `lookupHost` uses the given resolver
    pub fn new(resolver: Arc<dyn Resolver>) -> Self {
        Self { resolver }
    }

    /// Read and render a template file
    pub async fn render_file(&self, path: &Path) -> Result<String> {
        let source = tokio::fs::read_to_string(path).await.map_err(|e| {
            Error::template(format!(
                "failed to read template {}: {}",
                path.display(),
                e
            ))
        })?;

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        self.render_source(name, source).await
    }

    /// Render template source text
    ///
    /// Rendering may perform blocking lookups, so it runs on the blocking pool.
    pub async fn render_source(
        &self,
        name: impl Into<String>,
        source: impl Into<String>,
    ) -> Result<String> {
        let name = name.into();
        let source = source.into();
        let env = environment(Arc::clone(&self.resolver), Handle::current());

        tokio::task::spawn_blocking(move || -> Result<String> {
            let template = env.template_from_named_str(&name, &source)?;
            Ok(template.render(context! {})?)
        })
        .await
        .map_err(|e| Error::template(format!("render task failed: {}", e)))?
    }
}

/// Build an environment with the injected function set
fn environment(resolver: Arc<dyn Resolver>, handle: Handle) -> Environment<'static> {
    let mut env = Environment::new();
    // Rendered files must end exactly as the template does
    env.set_keep_trailing_newline(true);

    // Lookup failures must not abort the render
    env.add_function("lookupHost", move |hostname: String| -> Vec<String> {
        match handle.block_on(resolver.resolve(&hostname)) {
            Ok(addresses) => addresses,
            Err(e) => {
                debug!("lookupHost({}) failed: {}", hostname, e);
                Vec::new()
            }
        }
    });

    env.add_function("add", add);
    env.add_function("addf", addf);
    env.add_function("mul", mul);
    env.add_function("mulf", mulf);
    env.add_function("div", div);
    env.add_function("divf", divf);

    env
}

fn add(i: i64, j: i64) -> std::result::Result<i64, minijinja::Error> {
    i.checked_add(j).ok_or_else(|| overflow("add"))
}

fn addf(i: f64, j: f64) -> f64 {
    i + j
}

fn mul(i: i64, j: i64) -> std::result::Result<i64, minijinja::Error> {
    i.checked_mul(j).ok_or_else(|| overflow("mul"))
}

fn mulf(i: f64, j: f64) -> f64 {
    i * j
}

fn div(i: i64, j: i64) -> std::result::Result<i64, minijinja::Error> {
    if j == 0 {
        return Err(minijinja::Error::new(
            ErrorKind::InvalidOperation,
            "integer division by zero",
        ));
    }
    i.checked_div(j).ok_or_else(|| overflow("div"))
}

fn divf(i: f64, j: f64) -> f64 {
    i / j
}

fn overflow(op: &str) -> minijinja::Error {
    minijinja::Error::new(
        ErrorKind::InvalidOperation,
        format!("integer overflow in {}", op),
    )
}
