use crate::domain::model::CategoryId;
use crate::utils::error::Result;

/// What a host page can do with category layers regardless of which
/// rendering strategy sits behind them.
pub trait CategoryLayers {
    fn set_category_visible(&mut self, category_id: &str, visible: bool) -> Result<()>;

    fn show_all(&mut self);

    fn hide_all(&mut self);

    /// Frames everything currently drawn; `false` if nothing is.
    fn fit_all(&mut self) -> bool;

    fn shown_categories(&self) -> Vec<CategoryId>;

    fn show_only(&mut self, category_id: &str) -> Result<()> {
        self.hide_all();
        self.set_category_visible(category_id, true)
    }
}
