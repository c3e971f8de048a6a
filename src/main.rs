use log::info;
use std::fs;
use std::io;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use actix_web::{App, HttpServer, web};

use jgpio::{AppConfig, AppState, PinController};

#[cfg(feature = "hardware-gpio")]
use jgpio::LibgpiodBackend;
#[cfg(not(feature = "hardware-gpio"))]
use jgpio::MockGpioBackend;

const DEFAULT_CONFIG_PATH: &str = "config.json";

fn load_config() -> io::Result<AppConfig> {
    let explicit = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("JGPIO_CONFIG").ok());

    let config = match explicit {
        Some(path) => AppConfig::load_from_file(&path).map_err(io::Error::other)?,
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
            AppConfig::load_from_file(DEFAULT_CONFIG_PATH).map_err(io::Error::other)?
        }
        None => {
            info!("No config file given, using defaults");
            AppConfig::default()
        }
    };
    config.validate().map_err(io::Error::other)?;

    Ok(config)
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    env_logger::init();

    let config = load_config()?;

    let backend = {
        #[cfg(feature = "hardware-gpio")]
        {
            Arc::new(LibgpiodBackend::new(&config.gpio_chip).map_err(|e| {
                io::Error::other(format!("Failed to init libgpiod backend: {e}"))
            })?)
        }
        #[cfg(not(feature = "hardware-gpio"))]
        {
            Arc::new(MockGpioBackend::default())
        }
    };

    let controller = Arc::new(PinController::new(backend));
    let app_state = AppState { controller };

    let http_cfg = config.http.clone();
    let scope_path = http_cfg.path.clone();
    let server = HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .service(app_state.api_scope(&scope_path))
    })
    .client_request_timeout(Duration::from_secs(http_cfg.timeout));

    let bind_addrs: String;
    let server = match (&http_cfg.unix_socket, &http_cfg.host) {
        (Some(socket_path), Some(host)) => {
            if Path::new(socket_path).exists() {
                fs::remove_file(socket_path)?;
            }
            bind_addrs = format!("{} and {}", socket_path, host);

            server.bind_uds(socket_path)?.bind_auto_h2c(host)?
        }
        (Some(socket_path), None) => {
            if Path::new(socket_path).exists() {
                fs::remove_file(socket_path)?;
            }
            bind_addrs = socket_path.clone();

            server.bind_uds(socket_path)?
        }
        (None, Some(host)) => {
            bind_addrs = host.clone();

            server.bind_auto_h2c(host)?
        }
        (None, None) => {
            return Err(io::Error::other(
                "Config error: either 'unix_socket' or 'host' must be specified",
            ));
        }
    };

    info!("Starting server on {}{}...", bind_addrs, http_cfg.path);

    server.run().await
}
