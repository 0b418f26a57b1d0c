use uuid::Uuid;

use crate::{
    dto::reviews::{ReviewList, ReviewRequest},
    effects::{self, Effects},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{ClientInfo, NewUserLog, Product, UserLogType},
    response::ApiResponse,
    reviews,
    services::product_service::load_product,
    state::AppState,
};

pub async fn submit_review(
    state: &AppState,
    user: &AuthUser,
    client: &ClientInfo,
    payload: ReviewRequest,
) -> AppResult<ApiResponse<Product>> {
    if !(0.0..=5.0).contains(&payload.rating) {
        return Err(AppError::validation("Rating must be between 0 and 5"));
    }
    let author = state
        .users
        .find_by_id(user.user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;
    let mut product = load_product(state, payload.product_id).await?;

    let action = reviews::upsert_review(
        &mut product,
        author.id,
        &author.name,
        payload.rating,
        payload.comment.trim(),
    );
    state.products.save(&product).await?;

    let mut effects = Effects::new();
    effects.user_log(NewUserLog::new(
        UserLogType::SubmitReview,
        user.user_id,
        format!("{} for product \"{}\"", action.label(), product.name),
        client,
    ));
    effects::dispatch(state, effects).await;

    Ok(ApiResponse::ok(action.label(), product))
}

pub async fn product_reviews(state: &AppState, product_id: Uuid) -> AppResult<ApiResponse<ReviewList>> {
    let product = load_product(state, product_id).await?;
    Ok(ApiResponse::ok(
        "Reviews",
        ReviewList {
            reviews: product.reviews,
        },
    ))
}

/// Remove a review; only its author or an admin may do so.
pub async fn delete_review(
    state: &AppState,
    user: &AuthUser,
    client: &ClientInfo,
    product_id: Uuid,
    review_id: Uuid,
) -> AppResult<ApiResponse<Product>> {
    let mut product = load_product(state, product_id).await?;
    let author = product
        .reviews
        .iter()
        .find(|r| r.id == review_id)
        .map(|r| r.user)
        .ok_or_else(|| AppError::not_found("Review not found"))?;
    if author != user.user_id && !user.is_admin() {
        return Err(AppError::Forbidden);
    }

    reviews::remove_review(&mut product, review_id);
    state.products.save(&product).await?;

    let mut effects = Effects::new();
    effects.user_log(NewUserLog::new(
        UserLogType::DeleteReview,
        user.user_id,
        format!("Deleted review for product \"{}\"", product.name),
        client,
    ));
    effects::dispatch(state, effects).await;

    Ok(ApiResponse::ok("Review deleted", product))
}
