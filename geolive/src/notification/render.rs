//! Presentation artifacts.
//!
//! The renderer turns a selected event into an attachment (a position map).
//! Rendering can fail on its own; a failure only affects the tenant whose
//! notification was being prepared.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use tiny_skia::{Color, FillRule, Paint, PathBuilder, Pixmap, Rect, Stroke, Transform};

use crate::domain::{AlertEvent, FeedKind};

/// URL scheme referencing a file attached to the same message.
pub const ATTACHMENT_SCHEME: &str = "attachment://";

const MAP_WIDTH: u32 = 720;
const MAP_HEIGHT: u32 = 360;

/// A rendered file attached to a notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub filename: String,
    pub content_type: String,
    pub data: Bytes,
}

impl Artifact {
    /// `attachment://` reference usable as an embed image URL.
    pub fn attachment_ref(&self) -> String {
        format!("{ATTACHMENT_SCHEME}{}", self.filename)
    }
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("coordinates out of range: latitude {latitude}, longitude {longitude}")]
    OutOfRange { latitude: f64, longitude: f64 },
    #[error("render timed out after {0:?}")]
    Timeout(Duration),
    #[error("render failed: {0}")]
    Failed(String),
}

/// Produces the artifact attached to a notification.
#[async_trait]
pub trait AssetRenderer: Send + Sync {
    async fn render(&self, event: &AlertEvent) -> Result<Artifact, RenderError>;
}

/// Pixel position of a coordinate on the equirectangular map.
fn project(latitude: f64, longitude: f64) -> (f32, f32) {
    let x = (longitude + 180.0) / 360.0 * f64::from(MAP_WIDTH);
    let y = (90.0 - latitude) / 180.0 * f64::from(MAP_HEIGHT);
    (x as f32, y as f32)
}

fn paint(r: u8, g: u8, b: u8, a: u8) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(r, g, b, a);
    paint.anti_alias = true;
    paint
}

/// Equirectangular PNG map with one marker at the event position.
#[derive(Debug, Clone)]
pub struct PngMapRenderer {
    filename: &'static str,
}

impl PngMapRenderer {
    pub fn new(kind: FeedKind) -> Self {
        let filename = match kind {
            FeedKind::Earthquake => "quake_map.png",
            FeedKind::Weather => "weather_map.png",
            FeedKind::Iss => "iss_map.png",
        };
        Self { filename }
    }

    fn draw(&self, event: &AlertEvent) -> Result<Vec<u8>, RenderError> {
        let (lat, lon) = (event.latitude, event.longitude);
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
            return Err(RenderError::OutOfRange {
                latitude: lat,
                longitude: lon,
            });
        }

        let mut pixmap = Pixmap::new(MAP_WIDTH, MAP_HEIGHT)
            .ok_or_else(|| RenderError::Failed("cannot allocate canvas".to_string()))?;
        pixmap.fill(Color::from_rgba8(0xf4, 0xf6, 0xf8, 0xff));

        let (width, height) = (MAP_WIDTH as f32, MAP_HEIGHT as f32);
        let thin = Stroke {
            width: 1.0,
            ..Stroke::default()
        };

        // 30 degree graticule
        let mut grid = PathBuilder::new();
        for step in 1..12 {
            let gx = step as f32 * width / 12.0;
            grid.move_to(gx, 0.0);
            grid.line_to(gx, height);
        }
        for step in 1..6 {
            let gy = step as f32 * height / 6.0;
            grid.move_to(0.0, gy);
            grid.line_to(width, gy);
        }
        if let Some(path) = grid.finish() {
            pixmap.stroke_path(
                &path,
                &paint(0xdd, 0xdd, 0xdd, 0xff),
                &thin,
                Transform::identity(),
                None,
            );
        }

        if let Some(frame) = Rect::from_xywh(0.5, 0.5, width - 1.0, height - 1.0) {
            let path = PathBuilder::from_rect(frame);
            pixmap.stroke_path(
                &path,
                &paint(0x88, 0x88, 0x88, 0xff),
                &thin,
                Transform::identity(),
                None,
            );
        }

        let (x, y) = project(lat, lon);
        let radius = (event.magnitude * 2.0).clamp(3.0, 20.0) as f32;
        let marker = PathBuilder::from_circle(x, y, radius)
            .ok_or_else(|| RenderError::Failed(format!("invalid marker radius {radius}")))?;
        pixmap.fill_path(
            &marker,
            &paint(0xff, 0x00, 0x00, 0xcc),
            FillRule::Winding,
            Transform::identity(),
            None,
        );

        pixmap
            .encode_png()
            .map_err(|e| RenderError::Failed(format!("png encoding failed: {e}")))
    }
}

#[async_trait]
impl AssetRenderer for PngMapRenderer {
    async fn render(&self, event: &AlertEvent) -> Result<Artifact, RenderError> {
        let png = self.draw(event)?;
        Ok(Artifact {
            filename: self.filename.to_string(),
            content_type: "image/png".to_string(),
            data: Bytes::from(png),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";

    fn event(lat: f64, lon: f64) -> AlertEvent {
        AlertEvent {
            place: "Test Ridge".to_string(),
            magnitude: 5.0,
            latitude: lat,
            longitude: lon,
            depth: Some(10.0),
            occurred_at: None,
            source_url: None,
        }
    }

    #[test]
    fn test_project() {
        assert_eq!(project(0.0, 0.0), (360.0, 180.0));
        assert_eq!(project(90.0, -180.0), (0.0, 0.0));
        assert_eq!(project(-90.0, 180.0), (720.0, 360.0));
    }

    #[tokio::test]
    async fn test_render_png_map() {
        let renderer = PngMapRenderer::new(FeedKind::Earthquake);
        let artifact = renderer.render(&event(0.0, 0.0)).await.unwrap();

        assert_eq!(artifact.filename, "quake_map.png");
        assert_eq!(artifact.content_type, "image/png");
        assert_eq!(artifact.attachment_ref(), "attachment://quake_map.png");
        assert!(artifact.data.starts_with(PNG_SIGNATURE));

        let image = Pixmap::decode_png(&artifact.data).unwrap();
        assert_eq!((image.width(), image.height()), (MAP_WIDTH, MAP_HEIGHT));

        // Marker at the map center, background in the corner.
        let marker = image.pixel(360, 180).unwrap();
        assert!(marker.red() > 200 && marker.green() < 100);
        let corner = image.pixel(5, 5).unwrap();
        assert_eq!((corner.red(), corner.green(), corner.blue()), (0xf4, 0xf6, 0xf8));
    }

    #[tokio::test]
    async fn test_filename_follows_feed() {
        let artifact = PngMapRenderer::new(FeedKind::Iss)
            .render(&event(51.6, -0.1))
            .await
            .unwrap();
        assert_eq!(artifact.filename, "iss_map.png");
    }

    #[tokio::test]
    async fn test_render_rejects_out_of_range() {
        let renderer = PngMapRenderer::new(FeedKind::Earthquake);
        let result = renderer.render(&event(95.0, 0.0)).await;
        assert!(matches!(result, Err(RenderError::OutOfRange { .. })));
    }
}
