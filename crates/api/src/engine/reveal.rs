use chrono::Utc;
use gallery_core::artwork::validate_comment;
use gallery_core::error::CoreError;
use gallery_core::reveal::{evaluate, ArtworkMetrics, RevealPolicy, TrackedCondition};
use gallery_core::types::{DbId, Timestamp};
use gallery_db::models::artwork::Artwork;
use gallery_db::models::artwork_view::CreateArtworkView;
use gallery_db::models::comment::{Comment, CreateComment};
use gallery_db::repositories::{
    ArtworkRepo, ArtworkViewRepo, CommentRepo, RevealConditionRepo, UserRepo,
};
use gallery_db::DbPool;
use gallery_events::RevealNotifier;
use sqlx::PgConnection;

use crate::error::{AppError, AppResult};

/// Who is looking at an artwork. All fields are optional.
#[derive(Debug, Clone, Default)]
pub struct ViewerInfo {
    pub user_id: Option<DbId>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// Result of [`RevealEngine::record_view`].
#[derive(Debug, Clone)]
pub struct ViewOutcome {
    /// The artwork as it stands after this view committed.
    pub artwork: Artwork,
    /// True only for the call that performed the hidden-to-revealed transition.
    pub revealed_now: bool,
    /// True if this view landed exactly on a milestone.
    pub milestone: bool,
}

/// Result of [`RevealEngine::record_comment`].
#[derive(Debug, Clone)]
pub struct CommentOutcome {
    pub comment: Comment,
    pub author_name: String,
    pub comment_count: i64,
    pub revealed_now: bool,
}

/// What the in-transaction evaluation decided.
struct Evaluation {
    revealed_now: bool,
    artist_name: String,
}

/// Read-check-act coordinator for artwork reveals.
#[derive(Debug, Clone)]
pub struct RevealEngine {
    pool: DbPool,
    policy: RevealPolicy,
    notifier: RevealNotifier,
}

impl RevealEngine {
    pub fn new(pool: DbPool, policy: RevealPolicy, notifier: RevealNotifier) -> Self {
        Self {
            pool,
            policy,
            notifier,
        }
    }

    /// Count one view, then evaluate the artwork's conditions.
    pub async fn record_view(&self, artwork_id: DbId, viewer: &ViewerInfo) -> AppResult<ViewOutcome> {
        let mut tx = self.pool.begin().await?;

        let mut artwork = ArtworkRepo::lock_for_update(&mut *tx, artwork_id)
            .await?
            .ok_or_else(|| AppError::not_found("Artwork", artwork_id))?;

        ArtworkViewRepo::create(
            &mut *tx,
            &CreateArtworkView {
                artwork_id,
                viewer_id: viewer.user_id,
                ip_address: viewer.ip_address.clone(),
                user_agent: viewer.user_agent.clone(),
            },
        )
        .await?;
        artwork.view_count = ArtworkRepo::increment_view_count(&mut *tx, artwork_id).await?;
        let comment_count = CommentRepo::count_for_artwork(&mut *tx, artwork_id).await?;

        let metrics = ArtworkMetrics {
            view_count: artwork.view_count,
            comment_count,
            now: Utc::now(),
        };
        let evaluation = self.evaluate_locked(&mut *tx, &artwork, &metrics).await?;

        tx.commit().await?;

        if evaluation.revealed_now {
            artwork.is_revealed = true;
        }
        let artwork_ref = artwork.to_ref(evaluation.artist_name);
        let milestone = self
            .notifier
            .notify_view_milestone(artwork_ref.clone(), artwork.view_count);
        if evaluation.revealed_now {
            self.notifier.notify_revealed(artwork_ref);
        }

        Ok(ViewOutcome {
            artwork,
            revealed_now: evaluation.revealed_now,
            milestone,
        })
    }

    /// Add a comment, then evaluate the artwork's conditions.
    pub async fn record_comment(
        &self,
        artwork_id: DbId,
        author_id: DbId,
        content: &str,
    ) -> AppResult<CommentOutcome> {
        validate_comment(content)?;

        let mut tx = self.pool.begin().await?;

        let artwork = ArtworkRepo::lock_for_update(&mut *tx, artwork_id)
            .await?
            .ok_or_else(|| AppError::not_found("Artwork", artwork_id))?;

        let author_name = UserRepo::find_username(&mut *tx, author_id)
            .await?
            .ok_or_else(|| AppError::not_found("User", author_id))?;

        let comment = CommentRepo::create(
            &mut *tx,
            &CreateComment {
                artwork_id,
                user_id: author_id,
                content: content.trim().to_string(),
            },
        )
        .await?;
        let comment_count = CommentRepo::count_for_artwork(&mut *tx, artwork_id).await?;

        let metrics = ArtworkMetrics {
            view_count: artwork.view_count,
            comment_count,
            now: Utc::now(),
        };
        let evaluation = self.evaluate_locked(&mut *tx, &artwork, &metrics).await?;

        tx.commit().await?;

        let artwork_ref = artwork.to_ref(evaluation.artist_name);
        self.notifier
            .notify_new_comment(artwork_ref.clone(), comment.id, author_id, author_name.clone());
        if evaluation.revealed_now {
            self.notifier.notify_revealed(artwork_ref);
        }

        Ok(CommentOutcome {
            comment,
            author_name,
            comment_count,
            revealed_now: evaluation.revealed_now,
        })
    }

    /// Evaluate an artwork against its current counters at `now`.
    ///
    /// Returns `true` only if this call revealed the artwork.
    pub async fn check_reveal(&self, artwork_id: DbId, now: Timestamp) -> AppResult<bool> {
        let mut tx = self.pool.begin().await?;

        let artwork = ArtworkRepo::lock_for_update(&mut *tx, artwork_id)
            .await?
            .ok_or_else(|| AppError::not_found("Artwork", artwork_id))?;

        if artwork.is_revealed {
            tx.commit().await?;
            return Ok(false);
        }

        let comment_count = CommentRepo::count_for_artwork(&mut *tx, artwork_id).await?;
        let metrics = ArtworkMetrics {
            view_count: artwork.view_count,
            comment_count,
            now,
        };
        let evaluation = self.evaluate_locked(&mut *tx, &artwork, &metrics).await?;

        tx.commit().await?;

        if evaluation.revealed_now {
            self.notifier
                .notify_revealed(artwork.to_ref(evaluation.artist_name));
        }
        Ok(evaluation.revealed_now)
    }

    /// Run the evaluator against a locked artwork row.
    ///
    /// Records newly satisfied conditions as met and performs the reveal
    /// write when the policy is satisfied. Must be called with the artwork's
    /// row lock held.
    async fn evaluate_locked(
        &self,
        conn: &mut PgConnection,
        artwork: &Artwork,
        metrics: &ArtworkMetrics,
    ) -> AppResult<Evaluation> {
        let artist_name = UserRepo::find_username(&mut *conn, artwork.artist_id)
            .await?
            .unwrap_or_default();

        if artwork.is_revealed {
            return Ok(Evaluation {
                revealed_now: false,
                artist_name,
            });
        }

        let rows = RevealConditionRepo::list_for_artwork(&mut *conn, artwork.id).await?;
        let mut tracked = Vec::with_capacity(rows.len());
        let mut newly_met = Vec::new();
        for row in &rows {
            let condition = row.to_tracked().map_err(|e| {
                AppError::Core(CoreError::Internal(format!(
                    "Stored reveal condition {} is invalid: {e}",
                    row.id
                )))
            })?;
            if !condition.is_met && evaluate(metrics, &condition.condition) {
                newly_met.push(row.id);
            }
            tracked.push(condition);
        }
        RevealConditionRepo::mark_met(&mut *conn, &newly_met).await?;

        let satisfied = self.policy.is_satisfied(metrics, &tracked);
        let (_, transitions) = artwork.reveal_state().advance(satisfied);
        let revealed_now = transitions && ArtworkRepo::mark_revealed(&mut *conn, artwork.id).await?;

        if revealed_now {
            tracing::debug!(
                artwork_id = artwork.id,
                policy = %self.policy,
                conditions = %tracked_summary(&tracked),
                "Reveal conditions satisfied"
            );
        }

        Ok(Evaluation {
            revealed_now,
            artist_name,
        })
    }
}

fn tracked_summary(tracked: &[TrackedCondition]) -> String {
    tracked
        .iter()
        .map(|t| t.condition.condition_type())
        .collect::<Vec<_>>()
        .join(",")
}
