pub mod enrichment;
pub mod fcm;
pub mod rbmq;
pub mod status;

pub(crate) const SERVICE_API_KEY_HEADER: &str = "X-Service-API-Key";
