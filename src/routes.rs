use std::sync::Arc;

use actix_web::{HttpRequest, HttpResponse, Responder, guard, http::Method, web};

use crate::error::AppError;
use crate::gpio::{GpioBackend, ModeResult, PinController};

pub struct AppState<B: GpioBackend> {
    pub controller: Arc<PinController<B>>,
}

impl<B: GpioBackend> Clone for AppState<B> {
    fn clone(&self) -> Self {
        Self {
            controller: Arc::clone(&self.controller),
        }
    }
}

impl<B: GpioBackend + 'static> AppState<B> {
    /// Fixed resources are registered ahead of the catch-all `/{pin_id}` ones.
    pub fn api_scope(&self, base_path: &str) -> actix_web::Scope {
        web::scope(base_path)
            .service(
                web::resource("/mode")
                    .route(web::get().to(get_mode::<B>))
                    .route(
                        web::route()
                            .guard(guard_not_methods(&[Method::GET]))
                            .to(method_not_allowed),
                    ),
            )
            .service(
                web::resource("/mode/{scheme}")
                    .route(web::post().to(set_mode::<B>))
                    .route(
                        web::route()
                            .guard(guard_not_methods(&[Method::POST]))
                            .to(method_not_allowed),
                    ),
            )
            .service(
                web::resource("/pins")
                    .route(web::get().to(list_pins::<B>))
                    .route(
                        web::route()
                            .guard(guard_not_methods(&[Method::GET]))
                            .to(method_not_allowed),
                    ),
            )
            .service(
                web::resource([
                    "/configure/{pin_id}/{direction}",
                    "/configure/{pin_id}/{direction}/{pull}",
                ])
                .route(web::post().to(configure::<B>))
                .route(
                    web::route()
                        .guard(guard_not_methods(&[Method::POST]))
                        .to(method_not_allowed),
                ),
            )
            .service(
                web::resource("/{pin_id}")
                    .route(web::get().to(get_value::<B>))
                    .route(
                        web::route()
                            .guard(guard_not_methods(&[Method::GET]))
                            .to(method_not_allowed),
                    ),
            )
            .service(
                web::resource("/{pin_id}/{state}")
                    .route(web::post().to(set_value::<B>))
                    .route(
                        web::route()
                            .guard(guard_not_methods(&[Method::POST]))
                            .to(method_not_allowed),
                    ),
            )
    }
}

async fn get_mode<B: GpioBackend + 'static>(
    state: web::Data<AppState<B>>,
) -> Result<impl Responder, AppError> {
    let mode = state.controller.mode();

    Ok(web::Json(ModeResult { mode }))
}

async fn set_mode<B: GpioBackend + 'static>(
    req: HttpRequest,
    state: web::Data<AppState<B>>,
) -> Result<impl Responder, AppError> {
    let scheme = path_param(&req, "scheme")?;
    let mode = state.controller.set_mode(scheme)?;

    Ok(web::Json(ModeResult { mode }))
}

async fn list_pins<B: GpioBackend + 'static>(
    state: web::Data<AppState<B>>,
) -> Result<impl Responder, AppError> {
    let pins = state.controller.list_pins();

    Ok(web::Json(pins))
}

async fn configure<B: GpioBackend + 'static>(
    req: HttpRequest,
    state: web::Data<AppState<B>>,
) -> Result<impl Responder, AppError> {
    let pin_id = path_param(&req, "pin_id")?;
    let direction = path_param(&req, "direction")?;
    let pull = req.match_info().get("pull");

    let result = state.controller.configure(pin_id, direction, pull)?;

    Ok(web::Json(result))
}

async fn get_value<B: GpioBackend + 'static>(
    req: HttpRequest,
    state: web::Data<AppState<B>>,
) -> Result<impl Responder, AppError> {
    let pin_id = path_param(&req, "pin_id")?;

    let result = state.controller.read_pin(pin_id)?;

    Ok(web::Json(result))
}

async fn set_value<B: GpioBackend + 'static>(
    req: HttpRequest,
    state: web::Data<AppState<B>>,
) -> Result<impl Responder, AppError> {
    let pin_id = path_param(&req, "pin_id")?;
    let value = path_param(&req, "state")?;

    let result = state.controller.write_pin(pin_id, value)?;

    Ok(web::Json(result))
}

fn path_param<'a>(req: &'a HttpRequest, name: &str) -> Result<&'a str, AppError> {
    req.match_info()
        .get(name)
        .ok_or_else(|| AppError::Config(format!("route is missing the {name} segment")))
}

async fn method_not_allowed() -> HttpResponse {
    HttpResponse::MethodNotAllowed().finish()
}

fn guard_not_methods(methods: &[Method]) -> impl guard::Guard {
    let allowed: Vec<Method> = methods.to_vec();
    guard::fn_guard(move |ctx| !allowed.iter().any(|m| m == ctx.head().method))
}
