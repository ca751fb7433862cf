//! Display backend trait for the OLED panel

/// Errors that can occur while driving the display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DisplayError {
    /// I2C transfer failed
    Bus,
    /// Used before `init` succeeded
    NotInitialized,
}

/// Text size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FontSize {
    /// Regular text, used for almost everything
    Small,
    /// Double-height headline text
    Large,
}

/// Monochrome text-oriented frame buffer display
///
/// Drawing calls only touch the frame buffer; nothing reaches the panel
/// until [`DisplayBackend::flush`].
pub trait DisplayBackend {
    /// Power up and configure the panel
    fn init(&mut self) -> Result<(), DisplayError>;

    /// Blank the frame buffer
    fn clear(&mut self);

    /// Draw text with its top-left corner at (`x`, `y`)
    ///
    /// Text running off the panel is clipped.
    fn draw_text(&mut self, x: i32, y: i32, text: &str, font: FontSize);

    /// Send the frame buffer to the panel
    fn flush(&mut self) -> Result<(), DisplayError>;

    /// Panel size in pixels as (width, height)
    fn dimensions(&self) -> (u32, u32);

    /// Rendered width of `text` in pixels
    fn text_width(&self, text: &str, font: FontSize) -> u32;
}
