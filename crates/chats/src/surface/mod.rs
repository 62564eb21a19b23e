//! The chat surface: render model plus the glue that keeps a mounted surface
//! subscribed to the chat it shows.

pub mod binding;
pub mod view;

pub use binding::{ChatSurfaceBinding, RedrawHook};
pub use view::{
    render_surface, AvatarSize, AvatarOptions, ChatView, HeaderView, MembersPanel,
    PersonCardInteraction, RenderedMessage, SurfaceView, ThreadView,
};
