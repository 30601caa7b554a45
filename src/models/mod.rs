pub mod category;
pub mod comment;
pub mod pagination;
pub mod post;
pub mod stats;
pub mod user;

pub use category::{Category, CategoryInput, CategoryPosts, CategoryWithCount, Tag};
pub use comment::{AdminComment, Comment, CommentCreated, CommentInput, CommentPage};
pub use pagination::{PageParams, Pagination};
pub use post::{
    LikeResponse, Post, PostCreated, PostDetail, PostFilter, PostInput, PostListQuery, PostPage,
    PostSearchQuery, PostStatus, PostSummary, StatusUpdate,
};
pub use stats::{
    AdminPostPage, AdminPostRow, Dashboard, DashboardStats, RecentComment, RecentPost, UserPage,
};
pub use user::{ChangePasswordRequest, Role, RoleUpdate, UpdateProfileRequest, User, UserStats};

use validator::ValidationError;

/// Rejects strings made only of whitespace.
pub(crate) fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}
