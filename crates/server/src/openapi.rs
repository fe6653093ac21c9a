use serde::Serialize;
use utoipa::OpenApi;
use utoipa::ToSchema;

#[derive(ToSchema)]
pub struct HealthResponse { pub status: String }

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewBookingDoc {
    /// Admin only; customers always book for themselves
    pub user_id: Option<String>,
    pub package_id: String,
    pub event_type: String,
    pub event_name: String,
    pub date: String,
    pub venue: String,
    /// Admin only
    pub total_amount: Option<f64>,
    /// Admin only
    pub paid_amount: Option<f64>,
    pub notes: Option<String>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookingPatchDoc {
    /// pending | approved | in-progress | completed | rejected
    pub status: Option<String>,
    pub assigned_team: Option<Vec<String>>,
    pub total_amount: Option<f64>,
    pub paid_amount: Option<f64>,
    pub notes: Option<String>,
    /// Version last read by the client
    pub version: Option<u64>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PackageInputDoc {
    pub name: String,
    pub price: f64,
    pub description: Option<String>,
    pub deliverables: Option<Vec<String>>,
    pub preview: Option<String>,
    pub duration: Option<String>,
    pub popular: Option<bool>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PackagePatchDoc {
    pub name: Option<String>,
    pub price: Option<f64>,
    pub description: Option<String>,
    pub deliverables: Option<Vec<String>>,
    pub preview: Option<String>,
    pub duration: Option<String>,
    pub popular: Option<bool>,
    pub version: Option<u64>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GalleryInputDoc {
    /// photo | video
    #[serde(rename = "type")]
    pub media_type: String,
    pub url: String,
    pub thumbnail: Option<String>,
    pub title: String,
    pub category: Option<String>,
    pub event_type: Option<String>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContactInputDoc {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub event_date: Option<String>,
    pub message: String,
}

#[derive(ToSchema)]
pub struct ReadUpdateDoc { pub read: bool }

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfilePatchDoc {
    pub name: Option<String>,
    pub image: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub team_profile: Option<serde_json::Value>,
    #[schema(value_type = Option<Object>)]
    pub customer_profile: Option<serde_json::Value>,
    pub version: Option<u64>,
}

#[derive(ToSchema)]
pub struct RoleUpdateDoc {
    /// team | customer
    pub role: String,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStatsDoc {
    pub total_bookings: usize,
    pub pending_bookings: usize,
    pub active_bookings: usize,
    pub completed_bookings: usize,
    pub total_revenue: f64,
    pub outstanding_balance: f64,
    pub packages: usize,
    pub customers: usize,
    pub team_members: usize,
    pub unread_messages: usize,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::auth::signin,
        crate::routes::auth::callback,
        crate::routes::auth::signout,
        crate::routes::auth::session,
        crate::routes::dashboard::dashboard,
        crate::routes::packages::public_list,
        crate::routes::packages::public_get,
        crate::routes::packages::list,
        crate::routes::packages::create,
        crate::routes::packages::get,
        crate::routes::packages::update,
        crate::routes::packages::delete,
        crate::routes::gallery::public_list,
        crate::routes::gallery::list,
        crate::routes::gallery::create,
        crate::routes::gallery::delete,
        crate::routes::contact::submit,
        crate::routes::contact::list,
        crate::routes::contact::get,
        crate::routes::contact::mark_read,
        crate::routes::contact::delete,
        crate::routes::bookings::list,
        crate::routes::bookings::create,
        crate::routes::bookings::get,
        crate::routes::bookings::update,
        crate::routes::bookings::delete,
        crate::routes::users::list,
        crate::routes::users::get,
        crate::routes::users::update_profile,
        crate::routes::users::update_role,
        crate::routes::users::delete,
        crate::routes::stats::summary,
    ),
    components(
        schemas(
            HealthResponse,
            NewBookingDoc,
            BookingPatchDoc,
            PackageInputDoc,
            PackagePatchDoc,
            GalleryInputDoc,
            ContactInputDoc,
            ReadUpdateDoc,
            ProfilePatchDoc,
            RoleUpdateDoc,
            DashboardStatsDoc,
            crate::routes::auth::SessionOutput,
            crate::routes::contact::ContactAck,
        )
    ),
    tags(
        (name = "health"),
        (name = "auth"),
        (name = "catalog"),
        (name = "bookings"),
        (name = "users"),
        (name = "admin")
    )
)]
pub struct ApiDoc;
