use domain::{Action, Comment, CommentsConfig, Error, Post};
use std::net::IpAddr;
use storage::Db;
use tracing::{info, warn};

#[derive(Debug)]
pub enum Outcome {
    Container(Post),
    Moderated(Comment),
    Created(Comment),
    Ignored,
}

/// Runs one parsed form submission against `slug` on the configured site.
pub async fn dispatch(
    db: &Db,
    config: &CommentsConfig,
    slug: &str,
    action: Option<Action>,
    ip_address: Option<IpAddr>,
) -> domain::Result<Outcome> {
    let site_id = &config.site_id;

    let Some(action) = action else {
        warn!("Ignored form post on {}/{}: no recognised type", site_id, slug);
        return Ok(Outcome::Ignored);
    };

    match action {
        Action::Handle => {
            let mut post = db
                .get_post(site_id, slug)
                .await?
                .ok_or_else(|| Error::not_found("post", slug))?;
            post.toggle_can_comment();
            db.save_post(&post).await?;
            info!(
                "Comments on {}/{} are now {}",
                site_id,
                slug,
                if post.can_comment { "open" } else { "closed" }
            );
            Ok(Outcome::Container(post))
        }
        Action::Moderate { pk, .. } => {
            let comment = db.toggle_removed(&pk).await?;
            info!("Comment {} removed={}", comment.id, comment.is_removed);
            Ok(Outcome::Moderated(comment))
        }
        Action::Comment(form) => {
            let post = db
                .get_post(site_id, slug)
                .await?
                .ok_or_else(|| Error::not_found("post", slug))?;
            if !post.can_comment {
                return Err(Error::invalid("message", "Comments are closed for this post."));
            }
            let draft = form.into_draft(slug, ip_address);
            let comment = db.create_comment(site_id, draft, config.max_length).await?;
            Ok(Outcome::Created(comment))
        }
    }
}
