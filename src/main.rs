use actix_web::{middleware, web, App, HttpServer};
use log::info;

use library::{db, rest_config, Actions, Config};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = Config::from_env().expect("Failed to load configuration");

    // set up database connection pool
    let pool = db::init_pool(&config.database_url, config.pool_size)
        .expect("Failed to create pool.");
    let applied = db::run_migrations(&pool).expect("Failed to run migrations");
    info!("database {} ready, {} migration(s) applied", config.database_url, applied);

    // storage actors, one per pooled connection
    let actions = Actions::spawn(pool, config.pool_size as usize);

    info!("listening on {}", config.server_address);
    HttpServer::new(move || {
        App::new()
            // enable logger
            .wrap(middleware::Logger::default())
            // db actions
            .app_data(web::Data::new(actions.clone()))
            .configure(rest_config)
    })
    .bind(&config.server_address)?
    .run()
    .await?;

    info!("server stopped, storage pool released");
    Ok(())
}
