//! Fixed chart configuration
//!
//! Nothing here is request-configurable. Styles are handed to the renderer
//! as plain values so that no drawing state is shared between renders.

use plotters::style::RGBColor;

/// Number of most recent candles drawn
pub const WINDOW_SIZE: usize = 100;

/// Candle colors by direction
#[derive(Debug, Clone, Copy)]
pub struct MarketColors {
    pub up: RGBColor,
    pub down: RGBColor,
    /// Opacity of candle bodies and wicks
    pub alpha: f64,
    /// Opacity of volume bars after the volume panel is restyled
    pub volume_alpha: f64,
}

impl MarketColors {
    pub fn for_direction(&self, up: bool) -> RGBColor {
        if up {
            self.up
        } else {
            self.down
        }
    }
}

/// Dotted grid overlay of a single panel
#[derive(Debug, Clone, Copy)]
pub struct GridStyle {
    pub color: RGBColor,
    pub alpha: f64,
    /// Line width in points
    pub width: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct TitleStyle {
    pub color: RGBColor,
    /// Font size in points
    pub size: f64,
    /// Gap between the title and the price panel, in points
    pub pad: f64,
    pub bold: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct ChartStyle {
    pub colors: MarketColors,
    pub background: RGBColor,
    pub price_grid: GridStyle,
    pub volume_grid: GridStyle,
    pub spine_color: RGBColor,
    /// Spine width in points
    pub spine_width: f64,
    pub title: TitleStyle,
    /// Tick label font size in points
    pub label_size: f64,
    pub y_on_right: bool,
}

impl Default for ChartStyle {
    fn default() -> Self {
        let grid = RGBColor(0xe0, 0xe0, 0xe0);
        Self {
            colors: MarketColors {
                up: RGBColor(0x00, 0xD4, 0xAA),
                down: RGBColor(0xFF, 0x6B, 0x6B),
                alpha: 0.9,
                volume_alpha: 0.7,
            },
            background: RGBColor(0xff, 0xff, 0xff),
            price_grid: GridStyle {
                color: grid,
                alpha: 0.3,
                width: 0.5,
            },
            volume_grid: GridStyle {
                color: grid,
                alpha: 0.2,
                width: 0.5,
            },
            spine_color: RGBColor(0x00, 0x00, 0x00),
            spine_width: 1.5,
            title: TitleStyle {
                color: RGBColor(0x21, 0x21, 0x21),
                size: 16.0,
                pad: 20.0,
                bold: true,
            },
            label_size: 10.0,
            y_on_right: true,
        }
    }
}

/// Figure geometry: canvas size, resolution and panel proportions
#[derive(Debug, Clone, Copy)]
pub struct PanelLayout {
    /// Figure size in inches
    pub fig_width: f64,
    pub fig_height: f64,
    pub dpi: f64,
    /// Relative plot heights of the price and volume panels
    pub panel_ratios: (u32, u32),
    pub price_label: &'static str,
    pub volume_label: &'static str,
    /// Margin kept around the content when cropping, in inches
    pub bbox_pad: f64,
}

impl Default for PanelLayout {
    fn default() -> Self {
        Self {
            fig_width: 16.0,
            fig_height: 9.0,
            dpi: 200.0,
            panel_ratios: (7, 1),
            price_label: "Price",
            volume_label: "Volume",
            bbox_pad: 0.1,
        }
    }
}

impl PanelLayout {
    /// Canvas size in pixels
    pub fn canvas_size(&self) -> (u32, u32) {
        (
            (self.fig_width * self.dpi).round() as u32,
            (self.fig_height * self.dpi).round() as u32,
        )
    }

    /// Convert a size in points to whole pixels, never below one
    pub fn px(&self, points: f64) -> u32 {
        ((points * self.dpi / 72.0).round() as u32).max(1)
    }

    pub fn bbox_pad_px(&self) -> u32 {
        (self.bbox_pad * self.dpi).round() as u32
    }

    /// Height of the price plot when `body_height` pixels are shared with the
    /// volume plot and `reserved` pixels go to padding and tick labels.
    /// The two plot heights keep `panel_ratios`.
    pub fn price_panel_height(&self, body_height: u32, reserved: u32) -> u32 {
        let (price, volume) = self.panel_ratios;
        let plots = body_height.saturating_sub(reserved);
        plots * price / (price + volume)
    }
}
