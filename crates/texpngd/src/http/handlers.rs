use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;

use texpng_types::{RenderRequest, RenderSuccess, StatusBody};

use super::context::RenderContext;
use super::errors::RenderError;

pub(super) async fn status() -> Json<StatusBody> {
    Json(StatusBody::ok())
}

pub(super) async fn render(
    State(context): State<RenderContext>,
    payload: Result<Json<RenderRequest>, JsonRejection>,
) -> Result<Json<RenderSuccess>, RenderError> {
    let outcome = match payload {
        Ok(Json(request)) => context.render(request).await,
        Err(rejection) => Err(RenderError::MalformedBody {
            message: rejection.body_text(),
        }),
    };

    match outcome {
        Ok(file) => {
            context.reporter().render_completed(&file);
            Ok(Json(RenderSuccess::new(file)))
        }
        Err(error) => {
            context.reporter().render_failed(&error);
            Err(error)
        }
    }
}
