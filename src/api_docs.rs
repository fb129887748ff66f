use crate::api;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::health::health_check,
        api::users::index,
        api::users::search,
        api::users::show,
        api::users::edit,
        api::relationships::create,
        api::relationships::destroy,
    ),
    tags(
        (name = "bookers", description = "Bookers API")
    )
)]
pub struct ApiDoc;
