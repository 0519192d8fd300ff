use sea_orm::{EntityTrait, QueryOrder};
use uuid::Uuid;

use crate::{
    db::DbPool,
    dto::services::ServiceList,
    entity::services::{Column as ServiceCol, Entity as Services, Model as ServiceModel},
    error::{AppError, AppResult},
    models::{Service, cents_to_major},
    response::{ApiResponse, Meta},
    state::AppState,
};

pub async fn list_services(state: &AppState) -> AppResult<ApiResponse<ServiceList>> {
    let items: Vec<Service> = Services::find()
        .order_by_asc(ServiceCol::DisplayOrder)
        .order_by_asc(ServiceCol::Name)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(service_from_entity)
        .collect();

    let total = items.len() as i64;
    Ok(ApiResponse::success(
        "Services",
        ServiceList { items },
        Some(Meta::new(1, total, total)),
    ))
}

pub async fn get_service(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Service>> {
    let service = find_service(state, id).await?;
    Ok(ApiResponse::success(
        "Service",
        service_from_entity(service),
        Some(Meta::empty()),
    ))
}

pub(crate) async fn find_service(state: &AppState, id: Uuid) -> AppResult<ServiceModel> {
    Services::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)
}

pub(crate) fn service_from_entity(model: ServiceModel) -> Service {
    let features = serde_json::from_value::<Vec<String>>(model.features).unwrap_or_default();
    Service {
        id: model.id,
        name: model.name,
        description: model.description,
        price: model.price_cents.map(cents_to_major),
        price_cents: model.price_cents,
        features,
        includes_media: model.includes_media,
        is_custom: model.is_custom,
        display_order: model.display_order,
    }
}

pub struct CatalogEntry {
    pub name: &'static str,
    pub description: &'static str,
    pub price_cents: Option<i64>,
    pub features: &'static [&'static str],
    pub includes_media: bool,
    pub is_custom: bool,
    pub display_order: i32,
}

pub const DEFAULT_CATALOG: [CatalogEntry; 4] = [
    CatalogEntry {
        name: "Basic Lawn Care",
        description: "Essential lawn maintenance including mowing, edging, and basic cleanup.",
        price_cents: Some(2500),
        features: &["Lawn mowing", "Edge trimming", "Basic cleanup"],
        includes_media: false,
        is_custom: false,
        display_order: 1,
    },
    CatalogEntry {
        name: "Premium Lawn Care",
        description: "Comprehensive lawn care with fertilization and weed control.",
        price_cents: Some(4500),
        features: &["Everything in Basic", "Fertilization", "Weed control", "Leaf removal"],
        includes_media: true,
        is_custom: false,
        display_order: 2,
    },
    CatalogEntry {
        name: "Deluxe Lawn Care",
        description: "Premium service with landscaping and garden maintenance.",
        price_cents: Some(6500),
        features: &[
            "Everything in Premium",
            "Landscaping",
            "Garden maintenance",
            "Seasonal cleanup",
        ],
        includes_media: true,
        is_custom: false,
        display_order: 3,
    },
    CatalogEntry {
        name: "Custom Service",
        description: "Tailored lawn care solution based on your specific needs and property assessment.",
        price_cents: None,
        features: &[
            "Personalized assessment",
            "Custom treatment plan",
            "Specialized equipment",
            "Expert consultation",
        ],
        includes_media: true,
        is_custom: true,
        display_order: 4,
    },
];

/// Upsert the default catalog by name and return the service ids in
/// display order.
pub async fn seed_default_catalog(pool: &DbPool) -> AppResult<Vec<Uuid>> {
    let mut ids = Vec::with_capacity(DEFAULT_CATALOG.len());
    for entry in &DEFAULT_CATALOG {
        let (id,): (Uuid,) = sqlx::query_as(
            r#"
            INSERT INTO services
                (id, name, description, price_cents, features, includes_media, is_custom, display_order)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (name) DO UPDATE SET
                description = EXCLUDED.description,
                price_cents = EXCLUDED.price_cents,
                features = EXCLUDED.features,
                includes_media = EXCLUDED.includes_media,
                is_custom = EXCLUDED.is_custom,
                display_order = EXCLUDED.display_order
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(entry.name)
        .bind(entry.description)
        .bind(entry.price_cents)
        .bind(serde_json::json!(entry.features))
        .bind(entry.includes_media)
        .bind(entry.is_custom)
        .bind(entry.display_order)
        .fetch_one(pool)
        .await?;

        tracing::debug!(service = entry.name, %id, "catalog entry seeded");
        ids.push(id);
    }
    Ok(ids)
}
