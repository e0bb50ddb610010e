pub mod comment;
pub mod post;
pub mod user;

pub use comment::{build_threads, Comment, CommentThread, CommentView, InsertComment};
pub use post::{InsertPost, Post, PostView, UpdatePost};
pub use user::{AuthorView, InsertUser, UpdateUserProfile, User, UserView};
