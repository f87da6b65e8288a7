//! OpenAPI document aggregating every annotated handler.

use utoipa::OpenApi;

use crate::api::dto::{
    CreateEventRequest, CreateLimitRequest, EventListResponse, EventResponse, LimitListResponse,
    LimitResponse, ParticipantListResponse, PaymentResponse, RegisterRequest,
    RegistrationResponse, UpdateLimitRequest,
};
use crate::api::handlers::{event, limit, participant, system};
use crate::error::{ErrorBody, ErrorResponse};

/// OpenAPI description of the REST surface.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "eventum-api",
        description = "Event registration with role-based pricing and per-role capacity limits."
    ),
    paths(
        system::health_handler,
        event::create_event,
        event::list_events,
        event::get_event,
        participant::list_participants,
        participant::register,
        participant::set_payment,
        limit::list_limits,
        limit::create_limit,
        limit::get_role_limit,
        limit::update_role_limit,
        limit::get_limit,
    ),
    components(schemas(
        CreateEventRequest,
        EventListResponse,
        EventResponse,
        RegisterRequest,
        RegistrationResponse,
        PaymentResponse,
        ParticipantListResponse,
        CreateLimitRequest,
        UpdateLimitRequest,
        LimitListResponse,
        LimitResponse,
        ErrorResponse,
        ErrorBody,
    )),
    tags(
        (name = "System", description = "Service health"),
        (name = "Events", description = "Event lifecycle"),
        (name = "Participants", description = "Registration and payment"),
        (name = "Limits", description = "Capacity limits and allocation"),
    )
)]
pub struct ApiDoc;
