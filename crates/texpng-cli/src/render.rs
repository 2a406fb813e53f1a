//! The `texpng render` flow.

use std::io::Write;
use std::path::{Path, PathBuf};

use texpng_types::{DEFAULT_OUT_FILE, RenderRequest};

use crate::AppError;
use crate::cli::RenderArgs;
use crate::lifecycle::{self, LifecycleContext};
use crate::transport::RenderClient;

/// A render invocation with every path made absolute.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RenderPlan {
    pub(crate) request: RenderRequest,
    pub(crate) macros: Option<PathBuf>,
}

impl RenderPlan {
    /// Resolves `args` against `cwd`, failing when the input does not exist.
    pub(crate) fn resolve(args: RenderArgs, cwd: &Path) -> Result<Self, AppError> {
        let input = cwd.join(&args.input);
        if !input.exists() {
            return Err(AppError::MissingInput { path: input });
        }
        let output = cwd.join(
            args.output
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUT_FILE)),
        );

        let mut request =
            RenderRequest::new(path_text(input)?).with_out_file(path_text(output)?);
        if let Some(color) = args.color {
            request = request.with_color(color);
        }
        if let Some(font_size) = args.font_size {
            request = request.with_font_size(font_size);
        }
        Ok(Self {
            request,
            macros: args.macros.map(|macros| cwd.join(macros)),
        })
    }
}

fn path_text(path: PathBuf) -> Result<String, AppError> {
    path.into_os_string()
        .into_string()
        .map_err(|raw| AppError::NonUtf8Path {
            path: PathBuf::from(raw),
        })
}

/// Ensures the service is up, submits the request, and reports the file.
pub(crate) async fn execute<W, E>(
    plan: RenderPlan,
    context: LifecycleContext<'_>,
    stdout: &mut W,
    stderr: &mut E,
) -> Result<(), AppError>
where
    W: Write,
    E: Write,
{
    let client = RenderClient::new(context.config.base_url())?;
    lifecycle::ensure_running(context, &client, plan.macros.as_deref(), stderr).await?;
    let reply = client.render(&plan.request).await?;
    let _ = writeln!(stdout, "Rendered {}", reply.file);
    Ok(())
}
