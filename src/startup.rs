use actix_web::dev::Server;
use actix_web::{web, App, HttpServer};
use std::net::TcpListener;

use crate::auth::AuthService;
use crate::error::{AppError, ValidationError};
use crate::logger::RequestLogger;
use crate::middleware::AuthGate;
use crate::routes::{
    change_password, current_user, health_check, login, logout, refresh_token, register,
    update_account, update_avatar, update_cover_image,
};

pub fn run(listener: TcpListener, auth: AuthService) -> Result<Server, std::io::Error> {
    let auth = web::Data::new(auth);

    let server = HttpServer::new(move || {
        // Body parse failures use the same error envelope as everything else
        let json_config = web::JsonConfig::default().error_handler(|err, _req| {
            AppError::from(ValidationError::MalformedBody(err.to_string())).into()
        });
        let form_config = web::FormConfig::default().error_handler(|err, _req| {
            AppError::from(ValidationError::MalformedBody(err.to_string())).into()
        });

        App::new()
            .wrap(RequestLogger)
            .app_data(auth.clone())
            .app_data(json_config)
            .app_data(form_config)
            .route("/health_check", web::get().to(health_check))
            .service(
                web::scope("/api/v1/users")
                    // Public
                    .route("/register", web::post().to(register))
                    .route("/login", web::post().to(login))
                    .route("/refresh-token", web::post().to(refresh_token))
                    // Behind the auth gate
                    .service(
                        web::resource("/logout")
                            .wrap(AuthGate::new(auth.clone()))
                            .route(web::post().to(logout)),
                    )
                    .service(
                        web::resource("/current-user")
                            .wrap(AuthGate::new(auth.clone()))
                            .route(web::get().to(current_user)),
                    )
                    .service(
                        web::resource("/change-password")
                            .wrap(AuthGate::new(auth.clone()))
                            .route(web::post().to(change_password)),
                    )
                    .service(
                        web::resource("/update-account")
                            .wrap(AuthGate::new(auth.clone()))
                            .route(web::patch().to(update_account)),
                    )
                    .service(
                        web::resource("/update-avatar")
                            .wrap(AuthGate::new(auth.clone()))
                            .route(web::patch().to(update_avatar)),
                    )
                    .service(
                        web::resource("/update-cover-image")
                            .wrap(AuthGate::new(auth.clone()))
                            .route(web::patch().to(update_cover_image)),
                    ),
            )
    })
    .listen(listener)?
    .run();

    Ok(server)
}
