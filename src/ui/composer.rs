use crate::chat::ImagePayload;
use crate::theme::Theme;
use egui::RichText;
use std::path::Path;

#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub text: String,
    pub image: Option<ImagePayload>,
}

#[derive(Debug, Default)]
pub struct Composer {
    input: String,
    attachment: Option<ImagePayload>,
    last_error: Option<String>,
}

impl Composer {
    pub fn attach(&mut self, image: ImagePayload) {
        self.attachment = Some(image);
        self.last_error = None;
    }

    /// Takes the current input for sending. Whitespace-only text without an
    /// image is not a submission and leaves the composer untouched. The text
    /// goes out as typed; trimming only decides emptiness.
    pub fn take_submission(&mut self) -> Option<Submission> {
        if self.input.trim().is_empty() && self.attachment.is_none() {
            return None;
        }
        Some(Submission {
            text: std::mem::take(&mut self.input),
            image: self.attachment.take(),
        })
    }

    pub fn show(&mut self, ui: &mut egui::Ui, theme: &Theme) -> Option<Submission> {
        let mut send_now = false;

        theme.composer_frame().show(ui, |ui| {
            if let Some(image) = &self.attachment {
                let mut remove = false;
                ui.horizontal(|ui| {
                    ui.label(
                        RichText::new(format!("Attached: {} ({})", image.file_name, image.media_type))
                            .small(),
                    );
                    remove = ui.small_button("x").on_hover_text("Remove image").clicked();
                });
                if remove {
                    self.attachment = None;
                }
            }
            if let Some(error) = &self.last_error {
                ui.label(RichText::new(error).small().color(theme.danger));
            }

            ui.horizontal(|ui| {
                if ui.button("Attach").on_hover_text("Attach a PNG or JPEG image").clicked() {
                    self.pick_image();
                }

                let send_width = 72.0;
                let response = ui.add(
                    egui::TextEdit::singleline(&mut self.input)
                        .desired_width(ui.available_width() - send_width)
                        .hint_text("Type your message..."),
                );
                if response.lost_focus() && ui.input(|input| input.key_pressed(egui::Key::Enter)) {
                    send_now = true;
                    response.request_focus();
                }

                let can_send = !self.input.trim().is_empty() || self.attachment.is_some();
                send_now |= ui.add_enabled(can_send, egui::Button::new("Send")).clicked();
            });
        });

        if send_now {
            self.take_submission()
        } else {
            None
        }
    }

    fn pick_image(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .set_title("Attach image")
            .add_filter("Images", &["png", "jpg", "jpeg"])
            .pick_file()
        else {
            return;
        };

        match read_image(&path) {
            Ok(image) => {
                tracing::debug!(file = %image.file_name, bytes = image.bytes.len(), "image attached");
                self.attach(image);
            }
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "failed to read image");
                self.last_error = Some(format!("Could not read {}: {err}", path.display()));
            }
        }
    }
}

fn read_image(path: &Path) -> std::io::Result<ImagePayload> {
    let bytes = std::fs::read(path)?;
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("image")
        .to_string();
    Ok(ImagePayload::new(file_name, bytes))
}
