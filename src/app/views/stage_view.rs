use std::sync::Arc;

use egui::{Color32, TextureHandle, TextureOptions};
use image::RgbaImage;
use tracing::error;

use crate::app::views::View;
use crate::controller::RenderTarget;
use crate::media::{VideoFrame, decode_data_uri};

enum TextureSource {
    Frame(Arc<RgbaImage>),
    Payload(String),
}

/// Keeps the stage texture alive between frames and only re-uploads when the
/// picture changes.
#[derive(Default)]
pub struct StageTextures {
    texture: Option<TextureHandle>,
    cached: Option<(TextureSource, Result<TextureHandle, String>)>,
}

impl StageTextures {
    pub fn new() -> Self {
        Self::default()
    }

    fn frame(&mut self, ctx: &egui::Context, frame: &VideoFrame) -> TextureHandle {
        if let Some((TextureSource::Frame(current), Ok(texture))) = &self.cached {
            if Arc::ptr_eq(current, &frame.image) {
                return texture.clone();
            }
        }
        let texture = self.upload(ctx, &frame.image);
        self.cached = Some((TextureSource::Frame(frame.image.clone()), Ok(texture.clone())));
        texture
    }

    fn payload(&mut self, ctx: &egui::Context, payload: &str) -> Result<TextureHandle, String> {
        if let Some((TextureSource::Payload(current), result)) = &self.cached {
            if current == payload {
                return result.clone();
            }
        }
        let result = match decode_data_uri(payload) {
            Ok(image) => Ok(self.upload(ctx, &image)),
            Err(e) => {
                error!("Failed to decode processed image: {}", e);
                Err(e.to_string())
            }
        };
        self.cached = Some((TextureSource::Payload(payload.to_string()), result.clone()));
        result
    }

    fn upload(&mut self, ctx: &egui::Context, image: &RgbaImage) -> TextureHandle {
        let color_image = egui::ColorImage::from_rgba_unmultiplied(
            [image.width() as usize, image.height() as usize],
            image.as_raw(),
        );
        let texture = match self.texture.take() {
            Some(mut texture) => {
                texture.set(color_image, TextureOptions::LINEAR);
                texture
            }
            None => ctx.load_texture("stage", color_image, TextureOptions::LINEAR),
        };
        self.texture = Some(texture.clone());
        texture
    }
}

pub struct StageView<'a> {
    target: &'a RenderTarget,
    frame: Option<VideoFrame>,
    textures: &'a mut StageTextures,
}

impl<'a> StageView<'a> {
    pub fn new(
        target: &'a RenderTarget,
        frame: Option<VideoFrame>,
        textures: &'a mut StageTextures,
    ) -> Self {
        Self {
            target,
            frame,
            textures,
        }
    }

    fn draw_centered(ui: &mut egui::Ui, content: impl FnOnce(&mut egui::Ui)) {
        ui.vertical_centered(|ui| {
            ui.add_space(ui.available_height() * 0.35);
            content(ui);
        });
    }

    fn draw_loading(ui: &mut egui::Ui) {
        Self::draw_centered(ui, |ui| {
            ui.add(egui::Spinner::new().size(64.0));
            ui.add_space(16.0);
            ui.heading("ANALYZING");
            ui.monospace("Processing media data...");
        });
    }

    fn draw_idle(ui: &mut egui::Ui) {
        Self::draw_centered(ui, |ui| {
            ui.heading("AI DETECTION");
            ui.label("Waiting for input source");
        });
    }

    fn draw_texture(ui: &mut egui::Ui, texture: &TextureHandle) {
        ui.centered_and_justified(|ui| {
            ui.add(egui::Image::new(texture).shrink_to_fit());
        });
    }
}

impl View for StageView<'_> {
    fn draw(&mut self, ui: &mut egui::Ui) {
        let ctx = ui.ctx().clone();
        match self.target {
            RenderTarget::Loading => Self::draw_loading(ui),
            RenderTarget::Idle => Self::draw_idle(ui),
            RenderTarget::Stream(_) => match &self.frame {
                Some(frame) => {
                    let texture = self.textures.frame(&ctx, frame);
                    Self::draw_texture(ui, &texture);
                }
                None => Self::draw_centered(ui, |ui| {
                    ui.spinner();
                    ui.label("Connecting to stream...");
                }),
            },
            RenderTarget::Image(payload) => match self.textures.payload(&ctx, payload) {
                Ok(texture) => Self::draw_texture(ui, &texture),
                Err(e) => Self::draw_centered(ui, |ui| {
                    ui.colored_label(
                        Color32::LIGHT_RED,
                        format!("Could not display processed image: {}", e),
                    );
                }),
            },
        }
    }
}
