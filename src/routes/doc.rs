use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        addresses::{AddressList, CreateAddressRequest, UpdateAddressRequest},
        assessments::CreateAssessmentRequest,
        bookings::{BookingList, BookingListQuery, UpdateBookingRequest},
        checkout::{CheckoutRequest, CheckoutSessionCreated},
        services::ServiceList,
        webhook::WebhookAck,
    },
    models::{Address, Booking, BookingStatus, CustomAssessment, Profile, Service, TimeSlot},
    response::{ApiResponse, ErrorBody, ErrorResponse, FieldError, Meta},
    routes::{addresses, assessments, bookings, checkout, health, params, profile, services, webhook},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        health::readiness,
        services::list_services,
        services::get_service,
        addresses::list_addresses,
        addresses::create_address,
        addresses::get_address,
        addresses::update_address,
        addresses::delete_address,
        checkout::create_checkout,
        webhook::stripe_webhook,
        bookings::list_bookings,
        bookings::get_booking,
        bookings::update_booking,
        bookings::cancel_booking,
        assessments::create_assessment,
        profile::get_profile
    ),
    components(
        schemas(
            Profile,
            Service,
            Address,
            Booking,
            BookingStatus,
            TimeSlot,
            CustomAssessment,
            ServiceList,
            AddressList,
            BookingList,
            CreateAddressRequest,
            UpdateAddressRequest,
            UpdateBookingRequest,
            BookingListQuery,
            CheckoutRequest,
            CheckoutSessionCreated,
            CreateAssessmentRequest,
            WebhookAck,
            params::Pagination,
            Meta,
            FieldError,
            ErrorBody,
            ErrorResponse,
            ApiResponse<Service>,
            ApiResponse<ServiceList>,
            ApiResponse<Address>,
            ApiResponse<AddressList>,
            ApiResponse<Booking>,
            ApiResponse<BookingList>,
            ApiResponse<CustomAssessment>,
            ApiResponse<Profile>
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Liveness and readiness probes"),
        (name = "Services", description = "Lawn-care service catalog"),
        (name = "Addresses", description = "Customer service locations"),
        (name = "Checkout", description = "Hosted payment sessions for booking drafts"),
        (name = "Webhooks", description = "Payment provider callbacks"),
        (name = "Bookings", description = "Paid bookings and their lifecycle"),
        (name = "Assessments", description = "On-site assessment requests"),
        (name = "Profile", description = "Caller profile"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
