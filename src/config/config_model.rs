#[derive(Debug, Clone)]
pub struct DotEnvyConfig {
    pub server: Server,
    pub database: Database,
    pub auth: Auth,
    pub service_otp: ServiceOtp,
    pub wallet: Wallet,
    pub payment_gateway: PaymentGateway,
}

#[derive(Debug, Clone)]
pub struct Server {
    pub port: u16,
    pub timeout: u64,
    pub body_limit: u64,
}

#[derive(Debug, Clone)]
pub struct Database {
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct Auth {
    pub jwt_secret: String,
}

#[derive(Debug, Clone)]
pub struct ServiceOtp {
    pub ttl_minutes: i64,
    pub enforce_expiry: bool,
}

#[derive(Debug, Clone)]
pub struct Wallet {
    pub maturation_days: i64,
}

#[derive(Debug, Clone)]
pub struct PaymentGateway {
    pub base_url: String,
    pub key_id: String,
    pub key_secret: String,
}
