use crate::chat::{ImagePayload, Message, MessageId, Sender};
use crate::theme::Theme;
use egui::{ColorImage, Layout, RichText, ScrollArea, TextureHandle};
use std::collections::HashMap;

const THUMBNAIL_WIDTH: f32 = 240.0;

#[derive(Debug, Clone, PartialEq)]
pub enum MessageAction {
    PreviewImage(MessageId),
    OpenGalleryItem(String),
}

/// Decoded textures for message images, keyed by message. A failed decode is
/// remembered so it is not retried every frame.
#[derive(Default)]
pub struct ImageCache {
    textures: HashMap<MessageId, Option<TextureHandle>>,
}

impl ImageCache {
    pub fn texture(
        &mut self,
        ctx: &egui::Context,
        id: MessageId,
        image: &ImagePayload,
    ) -> Option<&TextureHandle> {
        self.textures
            .entry(id)
            .or_insert_with(|| match decode_image(&image.bytes) {
                Ok(color_image) => Some(ctx.load_texture(
                    format!("message-image-{}", id.value()),
                    color_image,
                    egui::TextureOptions::LINEAR,
                )),
                Err(err) => {
                    tracing::warn!(file = %image.file_name, error = %err, "could not decode image");
                    None
                }
            })
            .as_ref()
    }
}

pub fn decode_image(bytes: &[u8]) -> Result<ColorImage, image::ImageError> {
    let rgba = image::load_from_memory(bytes)?.to_rgba8();
    let size = [rgba.width() as usize, rgba.height() as usize];
    Ok(ColorImage::from_rgba_unmultiplied(size, rgba.as_raw()))
}

pub fn message_list(
    ui: &mut egui::Ui,
    theme: &Theme,
    messages: &[Message],
    images: &mut ImageCache,
    scroll_to_bottom: bool,
) -> Option<MessageAction> {
    let mut action = None;
    ScrollArea::vertical()
        .id_salt("chat_transcript")
        .auto_shrink([false, false])
        .stick_to_bottom(true)
        .show(ui, |ui| {
            for message in messages {
                if let Some(clicked) = message_item(ui, theme, message, images) {
                    action = Some(clicked);
                }
                ui.add_space(theme.spacing_4);
            }
            if scroll_to_bottom {
                ui.scroll_to_cursor(Some(egui::Align::BOTTOM));
            }
        });
    action
}

fn message_item(
    ui: &mut egui::Ui,
    theme: &Theme,
    message: &Message,
    images: &mut ImageCache,
) -> Option<MessageAction> {
    let layout = match message.sender {
        Sender::User => Layout::top_down(egui::Align::Max),
        Sender::Bella => Layout::top_down(egui::Align::Min),
    };
    let max_width = (ui.available_width() * 0.75).max(200.0);
    let mut action = None;

    ui.with_layout(layout, |ui| {
        ui.label(
            RichText::new(message.sender.display_name())
                .small()
                .color(theme.text_muted),
        );
        theme.bubble_frame(message.sender).show(ui, |ui| {
            ui.set_max_width(max_width);

            if let Some(image) = &message.image {
                match images.texture(ui.ctx(), message.id, image) {
                    Some(texture) => {
                        let response = ui.add(
                            egui::Image::new(texture)
                                .max_width(THUMBNAIL_WIDTH)
                                .corner_radius(egui::CornerRadius::same(theme.radius_8))
                                .sense(egui::Sense::click()),
                        );
                        if response.on_hover_text("Open image").clicked() {
                            action = Some(MessageAction::PreviewImage(message.id));
                        }
                    }
                    None => {
                        ui.label(
                            RichText::new(format!("[image: {}]", image.file_name))
                                .italics()
                                .color(theme.text_muted),
                        );
                    }
                }
            }

            ui.label(RichText::new(&message.text).color(theme.bubble_text(message.sender)));

            if !message.gallery.is_empty() {
                ui.separator();
                for result in &message.gallery {
                    let label = format!(
                        "{} ({:.0}% match)",
                        result.description,
                        result.similarity_score * 100.0
                    );
                    if ui.link(label).on_hover_text(&result.path).clicked() {
                        action = Some(MessageAction::OpenGalleryItem(result.path.clone()));
                    }
                }
            }
        });
    });

    action
}

#[cfg(test)]
mod tests {
    use super::decode_image;
    use image::{ImageBuffer, ImageFormat, Rgba};
    use std::io::Cursor;

    #[test]
    fn decodes_png_into_color_image() {
        let buffer: ImageBuffer<Rgba<u8>, Vec<u8>> =
            ImageBuffer::from_pixel(3, 2, Rgba([255, 0, 0, 255]));
        let mut png = Vec::new();
        buffer
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .expect("png should encode");

        let decoded = decode_image(&png).expect("png should decode");
        assert_eq!(decoded.size, [3, 2]);
    }

    #[test]
    fn rejects_non_image_bytes() {
        assert!(decode_image(b"definitely not an image").is_err());
    }
}
