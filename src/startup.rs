use actix_web::dev::Server;
use actix_web::{web, App, HttpServer};
use std::net::TcpListener;

use crate::auth::AuthService;
use crate::configuration::JwtSettings;
use crate::logger::LoggerMiddleware;
use crate::routes::{health_check, login, logout, refresh};

pub fn run(
    listener: TcpListener,
    service: AuthService,
    jwt_config: JwtSettings,
) -> Result<Server, std::io::Error> {
    let service = web::Data::new(service);
    let jwt_config = web::Data::new(jwt_config);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(LoggerMiddleware)

            // Shared state
            .app_data(service.clone())
            .app_data(jwt_config.clone())

            .route("/health_check", web::get().to(health_check))
            .route("/auth/login", web::post().to(login))
            .route("/auth/refresh", web::post().to(refresh))
            .route("/auth/logout", web::post().to(logout))
    })
    .listen(listener)?
    .run();

    Ok(server)
}
