pub mod api;
pub mod records;

pub use api::{ApiClient, MemoryTokenStore, RequestConfig, RequestError, TokenProvider};
pub use records::{
    Attachment, Category, Complaint, ComplaintDraft, HealthStatus, LoginRequest, RecordError,
    RegisterRequest, TokenResponse, UserProfile,
};
