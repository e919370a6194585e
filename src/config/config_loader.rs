use anyhow::{Context, Result};

use super::config_model::{
    Auth, Database, DotEnvyConfig, PaymentGateway, Server, ServiceOtp, Wallet,
};

pub fn load() -> Result<DotEnvyConfig> {
    dotenvy::dotenv().ok();

    let server = Server {
        port: std::env::var("SERVER_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .context("SERVER_PORT is invalid")?,
        body_limit: std::env::var("SERVER_BODY_LIMIT")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .context("SERVER_BODY_LIMIT is invalid")?,
        timeout: std::env::var("SERVER_TIMEOUT")
            .unwrap_or_else(|_| "90".to_string())
            .parse()
            .context("SERVER_TIMEOUT is invalid")?,
    };

    let database = Database {
        url: std::env::var("DATABASE_URL").context("DATABASE_URL is invalid")?,
    };

    let auth = Auth {
        jwt_secret: std::env::var("JWT_SECRET").context("JWT_SECRET is invalid")?,
    };

    let service_otp = ServiceOtp {
        ttl_minutes: std::env::var("SERVICE_OTP_TTL_MINUTES")
            .unwrap_or_else(|_| "15".to_string())
            .parse()
            .context("SERVICE_OTP_TTL_MINUTES is invalid")?,
        enforce_expiry: std::env::var("SERVICE_OTP_ENFORCE_EXPIRY")
            .unwrap_or_else(|_| "true".to_string())
            .parse()
            .context("SERVICE_OTP_ENFORCE_EXPIRY is invalid")?,
    };

    let wallet = Wallet {
        maturation_days: std::env::var("WALLET_MATURATION_DAYS")
            .unwrap_or_else(|_| "3".to_string())
            .parse()
            .context("WALLET_MATURATION_DAYS is invalid")?,
    };

    let payment_gateway = PaymentGateway {
        base_url: std::env::var("PAYMENT_GATEWAY_BASE_URL")
            .context("PAYMENT_GATEWAY_BASE_URL is invalid")?,
        key_id: std::env::var("PAYMENT_GATEWAY_KEY_ID")
            .context("PAYMENT_GATEWAY_KEY_ID is invalid")?,
        key_secret: std::env::var("PAYMENT_GATEWAY_KEY_SECRET")
            .context("PAYMENT_GATEWAY_KEY_SECRET is invalid")?,
    };

    Ok(DotEnvyConfig {
        server,
        database,
        auth,
        service_otp,
        wallet,
        payment_gateway,
    })
}
