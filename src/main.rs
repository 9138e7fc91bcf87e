use actix_web::{App, HttpServer, middleware::Logger, web};
use chrono::Local; // timestamp in log lines
use env_logger::{Env, Target};
use std::io::Write; // for env_logger custom formatter

use clubcore_backend::{
    config::Config,
    database::{create_pool, run_migrations},
    external::{EmailService, TwilioService, VnpayService},
    handlers,
    middlewares::{AuthMiddleware, create_cors},
    services::*,
    swagger::swagger_config,
    utils::JwtService,
};

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

    // 加载配置
    let config = Config::from_toml().expect("Failed to load configuration file");

    // 创建数据库连接池
    let pool = create_pool(&config.database)
        .await
        .expect("Failed to create database connection pool");

    // 运行数据库迁移
    run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");

    // 创建JWT服务
    let jwt_service = JwtService::new(
        &config.jwt.secret,
        config.jwt.access_token_expires_in,
        config.jwt.refresh_token_expires_in,
    );

    // 创建外部服务
    let email_service = EmailService::new(config.smtp.clone());
    let twilio_service = TwilioService::new(config.twilio.clone());
    let vnpay_service = VnpayService::new(config.vnpay.clone());

    // 创建服务
    let auth_service = AuthService::new(pool.clone(), jwt_service.clone());
    let member_service = MemberService::new(pool.clone());
    let history_service = HistoryService::new(pool.clone());
    let renewal_service = RenewalService::new(pool.clone());
    let payment_service = PaymentService::new(pool.clone(), vnpay_service);
    let reward_service = RewardService::new(pool.clone());
    let chat_service = ChatService::new(pool.clone());
    let forgot_card_service = ForgotCardService::new(pool.clone());
    let password_reset_service =
        PasswordResetService::new(pool.clone(), email_service, twilio_service);

    // WebSocket 在线会话注册表，进程内共享
    let presence = PresenceRegistry::new();

    // 启动HTTP服务器
    log::info!(
        "Starting HTTP server at {}:{}",
        config.server.host,
        config.server.port
    );

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(create_cors())
            .wrap(AuthMiddleware::new(jwt_service.clone()))
            .app_data(web::Data::new(jwt_service.clone()))
            .app_data(web::Data::new(auth_service.clone()))
            .app_data(web::Data::new(member_service.clone()))
            .app_data(web::Data::new(history_service.clone()))
            .app_data(web::Data::new(renewal_service.clone()))
            .app_data(web::Data::new(payment_service.clone()))
            .app_data(web::Data::new(reward_service.clone()))
            .app_data(web::Data::new(chat_service.clone()))
            .app_data(web::Data::new(forgot_card_service.clone()))
            .app_data(web::Data::new(password_reset_service.clone()))
            .app_data(web::Data::new(presence.clone()))
            .configure(swagger_config)
            .configure(handlers::health_config)
            .configure(handlers::payment_config)
            .configure(handlers::ws_config)
            .service(
                // scope 不回溯，子路径前缀的分组必须先于父前缀注册
                web::scope("/api/v1")
                    .configure(handlers::password_reset_config)
                    .configure(handlers::auth_config)
                    .configure(handlers::history_config)
                    .configure(handlers::renewal_config)
                    .configure(handlers::member_config)
                    .configure(handlers::rewards_config)
                    .configure(handlers::forgot_card_config)
                    .configure(handlers::chat_config),
            )
    })
    .bind((config.server.host.as_str(), config.server.port))?
    .run()
    .await
}
