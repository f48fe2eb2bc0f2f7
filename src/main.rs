use actix_web::{App, HttpServer, middleware::Logger, web};
use chrono::Local; // timestamp in log lines
use env_logger::{Env, Target};
use std::io::Write; // for env_logger custom formatter

use fitmarket_backend::{
    config::Config,
    database::{create_pool, run_migrations},
    external::{MAX_VIDEO_BYTES, StorageService},
    handlers,
    middlewares::{AuthMiddleware, create_cors},
    services::*,
    swagger::swagger_config,
    tasks,
    utils::JwtService,
};

// 视频上传上限外加少量余量
const PAYLOAD_LIMIT_BYTES: usize = MAX_VIDEO_BYTES as usize + 1024 * 1024;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format(|buf, record| {
            let ts = Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z");
            let level = record.level().as_str().to_ascii_lowercase();
            let msg_json = serde_json::to_string(&format!("{}", record.args()))
                .unwrap_or_else(|_| "\"<invalid utf8>\"".to_string());
            writeln!(
                buf,
                "{{\"timestamp\":\"{}\",\"level\":\"{}\",\"message\":{},\"target\":\"{}\"}}",
                ts,
                level,
                msg_json,
                record.target(),
            )
        })
        .target(Target::Stdout)
        .init();

    // 加载配置，缺少关键配置时拒绝启动
    let config = Config::from_toml().expect("Failed to load configuration");

    // 创建数据库连接池
    let pool = create_pool(&config.database)
        .await
        .expect("Failed to create database connection pool");

    // 运行数据库迁移
    run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");

    let jwt_service = JwtService::new(
        &config.jwt.secret,
        config.jwt.access_token_expires_in,
        config.jwt.refresh_token_expires_in,
    );
    let storage_service = StorageService::new(config.storage.clone());

    // 创建服务
    let notification_service = NotificationService::new(pool.clone());
    let session_service =
        SessionService::new(pool.clone(), config.session.profile_lookup_timeout_ms);
    let auth_service = AuthService::new(
        pool.clone(),
        jwt_service.clone(),
        session_service.clone(),
        config.auth.clone(),
    );
    let profile_service = ProfileService::new(pool.clone());
    let store_service = StoreService::new(pool.clone());
    let package_service = PackageService::new(pool.clone());
    let purchase_service = PurchaseService::new(pool.clone(), notification_service.clone());
    let revenue_service = RevenueService::new(pool.clone());
    let class_service = ClassService::new(pool.clone(), notification_service.clone());
    let review_service = ReviewService::new(
        pool.clone(),
        store_service.clone(),
        notification_service.clone(),
    );
    let message_service = MessageService::new(pool.clone(), notification_service.clone());

    // 启动后台任务
    tasks::spawn_all(class_service.clone());

    log::info!(
        "Starting HTTP server at {}:{}",
        config.server.host,
        config.server.port
    );

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(AuthMiddleware::new(jwt_service.clone()))
            .wrap(create_cors())
            .app_data(web::PayloadConfig::new(PAYLOAD_LIMIT_BYTES))
            .app_data(web::Data::new(auth_service.clone()))
            .app_data(web::Data::new(session_service.clone()))
            .app_data(web::Data::new(profile_service.clone()))
            .app_data(web::Data::new(store_service.clone()))
            .app_data(web::Data::new(package_service.clone()))
            .app_data(web::Data::new(purchase_service.clone()))
            .app_data(web::Data::new(revenue_service.clone()))
            .app_data(web::Data::new(class_service.clone()))
            .app_data(web::Data::new(review_service.clone()))
            .app_data(web::Data::new(message_service.clone()))
            .app_data(web::Data::new(notification_service.clone()))
            .app_data(web::Data::new(storage_service.clone()))
            .configure(swagger_config)
            .configure(handlers::health_config)
            .service(
                web::scope("/api/v1")
                    .configure(handlers::auth_config)
                    .configure(handlers::session_config)
                    .configure(handlers::profile_config)
                    .configure(handlers::admin_config)
                    .configure(handlers::coach_config)
                    .configure(handlers::stores_config)
                    .configure(handlers::purchases_config)
                    .configure(handlers::classes_config)
                    .configure(handlers::messages_config)
                    .configure(handlers::notifications_config)
                    .configure(handlers::media_config),
            )
    })
    .bind((config.server.host.as_str(), config.server.port))?
    .run()
    .await
}
