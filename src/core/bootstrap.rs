use uuid::Uuid;

use crate::core::security;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::types::UserRole;
use crate::repositories;
use crate::services::grading::{DEFAULT_BANDS, DEFAULT_PASSING_SCORE, DEFAULT_SCALE_NAME};

pub(crate) async fn ensure_superuser(state: &AppState) -> anyhow::Result<()> {
    let admin = state.settings().admin();
    if admin.first_admin_password.is_empty() {
        tracing::warn!("FIRST_ADMIN_PASSWORD not configured; skipping admin creation");
        return Ok(());
    }

    let email = &admin.first_admin_email;
    let user = repositories::users::find_by_email(state.db(), email).await?;
    let now = primitive_now_utc();

    if let Some(user) = user {
        let mut needs_update = false;

        let verified = security::verify_password(&admin.first_admin_password, &user.hashed_password)
            .unwrap_or(false);
        let hashed_password = if verified {
            None
        } else {
            needs_update = true;
            Some(security::hash_password(&admin.first_admin_password)?)
        };

        let role = if user.role != UserRole::Admin {
            needs_update = true;
            Some(UserRole::Admin)
        } else {
            None
        };

        let is_active = if !user.is_active {
            needs_update = true;
            Some(true)
        } else {
            None
        };

        if needs_update {
            repositories::users::update(
                state.db(),
                &user.id,
                repositories::users::UpdateUser {
                    email: None,
                    full_name: None,
                    role,
                    is_active,
                    hashed_password,
                    updated_at: now,
                },
            )
            .await?;
            tracing::info!("Updated default admin {email}");
        } else {
            tracing::info!("Default admin already up to date");
        }

        return Ok(());
    }

    let hashed_password = security::hash_password(&admin.first_admin_password)?;
    repositories::users::create(
        state.db(),
        repositories::users::CreateUser {
            id: &Uuid::new_v4().to_string(),
            email,
            hashed_password,
            full_name: "Administrator",
            role: UserRole::Admin,
            is_active: true,
            created_at: now,
            updated_at: now,
        },
    )
    .await?;

    tracing::info!("Created default admin {email}");
    Ok(())
}

/// Seeds the stock percentage scale so grading always has a default to
/// fall back on.
pub(crate) async fn ensure_default_grading_scale(state: &AppState) -> anyhow::Result<()> {
    if repositories::grading_scales::find_default(state.db()).await?.is_some() {
        return Ok(());
    }

    let now = primitive_now_utc();
    let mut tx = state.db().begin().await?;

    let scale = repositories::grading_scales::create(
        &mut *tx,
        repositories::grading_scales::CreateScale {
            id: &Uuid::new_v4().to_string(),
            name: DEFAULT_SCALE_NAME,
            description: Some("Percentage bands applied when no other scale is configured"),
            passing_score: DEFAULT_PASSING_SCORE,
            is_default: true,
            created_at: now,
            updated_at: now,
        },
    )
    .await?;

    for (name, min_score, max_score, grade_point) in DEFAULT_BANDS {
        repositories::grading_scales::create_band(
            &mut *tx,
            repositories::grading_scales::CreateBand {
                id: &Uuid::new_v4().to_string(),
                scale_id: &scale.id,
                name,
                min_score: *min_score,
                max_score: *max_score,
                grade_point: Some(*grade_point),
                description: None,
            },
        )
        .await?;
    }

    tx.commit().await?;
    tracing::info!(scale_id = %scale.id, "Seeded default grading scale");
    Ok(())
}
