use actix_web::web;
use utoipa::OpenApi;
use utoipa::{
    Modify,
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::entities::access_logs::{AccessDirection, AccessResult};
use crate::entities::cards::CardState;
use crate::entities::payments::{PaymentMethod, PaymentStatus};
use crate::entities::points_transactions::PointsTransactionType;
use crate::entities::rewards::RewardType;
use crate::entities::subscriptions::SubscriptionStatus;
use crate::entities::users::{UserRole, UserStatus};
use crate::handlers;
use crate::models::*;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.as_mut().unwrap();
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        )
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::auth::login,
        handlers::auth::refresh,
        handlers::auth::logout,
        handlers::auth::me,
        handlers::member::get_profile,
        handlers::member::get_card,
        handlers::member::get_package,
        handlers::member::get_points,
        handlers::member::get_points_history,
        handlers::history::get_access_history,
        handlers::renewal::list_plans,
        handlers::renewal::create_request,
        handlers::renewal::create_vnpay,
        handlers::payment::vnpay_callback,
        handlers::payment::vnpay_ipn,
        handlers::payment::create_vnpay_url,
        handlers::payment::vnpay_status,
        handlers::payment::confirm_payment,
        handlers::rewards::list_rewards,
        handlers::rewards::get_reward,
        handlers::rewards::redeem,
        handlers::forgot_card::request_passcode,
        handlers::forgot_card::verify_code,
        handlers::forgot_card::active_passcode,
        handlers::forgot_card::validate_passcode,
        handlers::password_reset::request_reset,
        handlers::password_reset::verify_reset_code,
        handlers::password_reset::reset_password,
        handlers::chat::get_messages,
        handlers::chat::send_message,
        handlers::chat::get_receptionist,
        handlers::chat::ws_chat,
        handlers::health::health_check,
    ),
    components(
        schemas(
            LoginRequest,
            UserInfo,
            AuthResponse,
            MeResponse,
            ProfileResponse,
            CardResponse,
            PackageResponse,
            PointsResponse,
            PointsHistoryItem,
            PaginationParams,
            AccessHistoryItem,
            PlanResponse,
            RenewalRequest,
            RenewalResponse,
            VnpayCreateRequest,
            VnpayCreateResponse,
            ConfirmPaymentResponse,
            VnpayCreateUrlRequest,
            VnpayCreateUrlResponse,
            VnpayStatusResponse,
            VnpayCallbackOutcome,
            IpnResponse,
            RewardResponse,
            RedeemRequest,
            RedeemResponse,
            ForgotCardRequestResponse,
            VerifyCodeRequest,
            PasscodeResponse,
            ValidatePasscodeRequest,
            GateValidationResponse,
            PasswordResetRequest,
            PasswordResetRequestResponse,
            PasswordResetVerifyRequest,
            PasswordResetResetRequest,
            ChatMessageResponse,
            SendMessageRequest,
            ChatHistoryQuery,
            ReceptionistResponse,
            ApiError,
            UserRole,
            UserStatus,
            CardState,
            SubscriptionStatus,
            PaymentMethod,
            PaymentStatus,
            PointsTransactionType,
            RewardType,
            AccessDirection,
            AccessResult,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Authentication API"),
        (name = "member", description = "Member profile API"),
        (name = "history", description = "Access history API"),
        (name = "renewal", description = "Subscription renewal API"),
        (name = "payment", description = "Payment and VNPay gateway API"),
        (name = "rewards", description = "Points rewards API"),
        (name = "forgot-card", description = "Lost card recovery API"),
        (name = "password-reset", description = "Password recovery API"),
        (name = "chat", description = "Support chat API"),
        (name = "health", description = "Service health API"),
    ),
    info(
        title = "ClubCore Backend API",
        version = "1.0.0",
        description = "ClubCore membership club backend REST API documentation",
        contact(
            name = "API Support",
            email = "support@clubcore.vn"
        )
    )
)]
pub struct ApiDoc;

pub fn swagger_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
    )
    .route(
        "/swagger-ui",
        web::get().to(|| async {
            actix_web::HttpResponse::Found()
                .append_header(("Location", "/swagger-ui/"))
                .finish()
        }),
    );
}
