//! Editing surfaces the session drives.

/// Rich-text body editor. Content is serialized HTML.
pub trait BodyEditor {
    fn set_content(&mut self, html: &str);
    fn focus(&mut self);
    fn set_cursor_position(&mut self, offset: usize);
}

/// Title input. Grows to fit its content.
pub trait TitleInput {
    fn resize_to_fit(&mut self, rows: usize);
    fn set_cursor_position(&mut self, offset: usize);
}
