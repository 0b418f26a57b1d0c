use uuid::Uuid;

use crate::models::{Product, Review};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewAction {
    Added,
    Updated,
}

impl ReviewAction {
    pub fn label(&self) -> &'static str {
        match self {
            ReviewAction::Added => "Review added",
            ReviewAction::Updated => "Review updated",
        }
    }
}

/// Insert the user's review, or overwrite their existing one in place.
pub fn upsert_review(
    product: &mut Product,
    user: Uuid,
    name: &str,
    rating: f64,
    comment: &str,
) -> ReviewAction {
    let action = match product.reviews.iter_mut().find(|r| r.user == user) {
        Some(existing) => {
            existing.rating = rating;
            existing.comment = comment.to_string();
            ReviewAction::Updated
        }
        None => {
            product.reviews.push(Review {
                id: Uuid::new_v4(),
                user,
                name: name.to_string(),
                rating,
                comment: comment.to_string(),
            });
            ReviewAction::Added
        }
    };
    recompute_ratings(product);
    action
}

/// Remove a review by id. Returns the removed review, if any.
pub fn remove_review(product: &mut Product, review_id: Uuid) -> Option<Review> {
    let idx = product.reviews.iter().position(|r| r.id == review_id)?;
    let removed = product.reviews.remove(idx);
    recompute_ratings(product);
    Some(removed)
}

pub fn recompute_ratings(product: &mut Product) {
    product.num_of_reviews = product.reviews.len() as i64;
    product.ratings = if product.reviews.is_empty() {
        0.0
    } else {
        product.reviews.iter().map(|r| r.rating).sum::<f64>() / product.reviews.len() as f64
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::product;

    #[test]
    fn second_review_by_same_user_overwrites() {
        let mut p = product("Kettle", 30, 4);
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        assert_eq!(upsert_review(&mut p, alice, "alice", 4.0, "good"), ReviewAction::Added);
        assert_eq!(upsert_review(&mut p, bob, "bob", 2.0, "meh"), ReviewAction::Added);
        assert_eq!(p.ratings, 3.0);

        assert_eq!(upsert_review(&mut p, alice, "alice", 5.0, "great"), ReviewAction::Updated);
        assert_eq!(p.num_of_reviews, 2);
        assert_eq!(p.ratings, 3.5);
        assert_eq!(p.reviews[0].comment, "great");
    }

    #[test]
    fn removing_last_review_resets_ratings() {
        let mut p = product("Kettle", 30, 4);
        upsert_review(&mut p, Uuid::new_v4(), "carol", 5.0, "nice");
        let id = p.reviews[0].id;

        assert!(remove_review(&mut p, Uuid::new_v4()).is_none());
        assert!(remove_review(&mut p, id).is_some());
        assert_eq!(p.num_of_reviews, 0);
        assert_eq!(p.ratings, 0.0);
    }
}
