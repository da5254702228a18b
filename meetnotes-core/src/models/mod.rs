mod meeting;

pub use meeting::{Meeting, MeetingPatch, EMPTY_BODY};
