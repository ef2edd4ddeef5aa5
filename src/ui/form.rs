use std::cell::Cell;
use std::rc::Rc;

use gtk4::prelude::*;
use gtk4::{
    Align, Box as GtkBox, Button, ColorButton, DropDown, Label, Orientation, SpinButton, TextView,
};

use super::style::LAYOUT_TOKENS;
use crate::editor::overlay::FONT_FAMILY_CHOICES;
use crate::editor::{OverlayEdit, TextAlign, TextOverlay};
use crate::geometry::Color;

const ALIGN_LABELS: [&str; 3] = ["Left", "Center", "Right"];

pub(super) fn color_to_rgba(color: Color) -> gtk4::gdk::RGBA {
    gtk4::gdk::RGBA::new(
        f32::from(color.r) / 255.0,
        f32::from(color.g) / 255.0,
        f32::from(color.b) / 255.0,
        1.0,
    )
}

pub(super) fn rgba_to_color(rgba: &gtk4::gdk::RGBA) -> Color {
    let channel = |value: f32| (value.clamp(0.0, 1.0) * 255.0).round() as u8;
    Color::new(
        channel(rgba.red()),
        channel(rgba.green()),
        channel(rgba.blue()),
    )
}

pub(super) fn family_choice_index(family: &str) -> Option<u32> {
    FONT_FAMILY_CHOICES
        .iter()
        .position(|(_, choice)| *choice == family)
        .and_then(|index| u32::try_from(index).ok())
}

fn align_index(align: TextAlign) -> u32 {
    match align {
        TextAlign::Left => 0,
        TextAlign::Center => 1,
        TextAlign::Right => 2,
    }
}

fn labeled_row(label: &str, field: &impl IsA<gtk4::Widget>) -> GtkBox {
    let row = GtkBox::new(Orientation::Horizontal, LAYOUT_TOKENS.spacing_8);
    let label = Label::new(Some(label));
    label.set_xalign(0.0);
    label.set_hexpand(true);
    row.append(&label);
    row.append(field);
    row
}

/// Property editor for the selected text layer.
#[derive(Clone)]
pub(super) struct LayerForm {
    pub(super) container: GtkBox,
    no_selection: Label,
    fields: GtkBox,
    text: TextView,
    font_size: SpinButton,
    font_family: DropDown,
    fill_color: ColorButton,
    stroke_color: ColorButton,
    stroke_width: SpinButton,
    align: DropDown,
    font_weight: SpinButton,
    delete: Button,
    syncing: Rc<Cell<bool>>,
}

impl LayerForm {
    pub(super) fn new() -> Self {
        let container = GtkBox::new(Orientation::Vertical, LAYOUT_TOKENS.spacing_8);
        let no_selection = Label::new(Some("Select a text layer to edit it."));
        no_selection.set_xalign(0.0);
        no_selection.add_css_class("dim-label");

        let fields = GtkBox::new(Orientation::Vertical, LAYOUT_TOKENS.spacing_8);
        let text = TextView::new();
        text.set_wrap_mode(gtk4::WrapMode::WordChar);
        text.set_size_request(-1, LAYOUT_TOKENS.text_field_min_height);
        text.add_css_class("card");

        let font_size = SpinButton::with_range(1.0, 400.0, 1.0);
        let family_labels = FONT_FAMILY_CHOICES
            .iter()
            .map(|(label, _)| *label)
            .collect::<Vec<_>>();
        let font_family = DropDown::from_strings(&family_labels);
        let fill_color = ColorButton::new();
        let stroke_color = ColorButton::new();
        let stroke_width = SpinButton::with_range(0.0, 60.0, 1.0);
        let align = DropDown::from_strings(&ALIGN_LABELS);
        let font_weight = SpinButton::with_range(100.0, 1000.0, 100.0);
        let delete = Button::with_label("Delete layer");
        delete.add_css_class("destructive-action");
        delete.set_halign(Align::End);

        fields.append(&text);
        fields.append(&labeled_row("Size", &font_size));
        fields.append(&labeled_row("Font", &font_family));
        fields.append(&labeled_row("Fill", &fill_color));
        fields.append(&labeled_row("Outline", &stroke_color));
        fields.append(&labeled_row("Outline width", &stroke_width));
        fields.append(&labeled_row("Align", &align));
        fields.append(&labeled_row("Weight", &font_weight));
        fields.append(&delete);

        container.append(&no_selection);
        container.append(&fields);

        Self {
            container,
            no_selection,
            fields,
            text,
            font_size,
            font_family,
            fill_color,
            stroke_color,
            stroke_width,
            align,
            font_weight,
            delete,
            syncing: Rc::new(Cell::new(false)),
        }
    }

    pub(super) fn text_view(&self) -> &TextView {
        &self.text
    }

    /// Mirrors the overlay into the widgets without emitting edits.
    pub(super) fn sync(&self, overlay: Option<&TextOverlay>) {
        self.no_selection.set_visible(overlay.is_none());
        self.fields.set_visible(overlay.is_some());
        let Some(overlay) = overlay else {
            return;
        };

        self.syncing.set(true);
        let buffer = self.text.buffer();
        let current = buffer.text(&buffer.start_iter(), &buffer.end_iter(), false);
        if current.as_str() != overlay.text {
            buffer.set_text(&overlay.text);
        }
        self.font_size.set_value(overlay.font_size);
        self.font_family.set_selected(
            family_choice_index(&overlay.font_family).unwrap_or(gtk4::INVALID_LIST_POSITION),
        );
        self.fill_color.set_rgba(&color_to_rgba(overlay.fill_color));
        self.stroke_color.set_rgba(&color_to_rgba(overlay.stroke_color));
        self.stroke_width.set_value(overlay.stroke_width);
        self.align.set_selected(align_index(overlay.align));
        self.font_weight.set_value(f64::from(overlay.font_weight));
        self.syncing.set(false);
    }

    pub(super) fn connect_edits<F>(&self, on_edit: F)
    where
        F: Fn(OverlayEdit) + Clone + 'static,
    {
        let emit = {
            let syncing = self.syncing.clone();
            move |edit: OverlayEdit| {
                if !syncing.get() {
                    on_edit(edit);
                }
            }
        };

        let handler = emit.clone();
        self.text.buffer().connect_changed(move |buffer| {
            let text = buffer.text(&buffer.start_iter(), &buffer.end_iter(), false);
            handler(OverlayEdit::Text(text.to_string()));
        });

        let handler = emit.clone();
        self.font_size.connect_value_changed(move |spin| {
            handler(OverlayEdit::FontSize(spin.value()));
        });

        let handler = emit.clone();
        self.font_family.connect_selected_notify(move |dropdown| {
            let family = usize::try_from(dropdown.selected())
                .ok()
                .and_then(|index| FONT_FAMILY_CHOICES.get(index));
            if let Some((_, family)) = family {
                handler(OverlayEdit::FontFamily((*family).to_string()));
            }
        });

        let handler = emit.clone();
        self.fill_color.connect_color_set(move |button| {
            handler(OverlayEdit::FillColor(rgba_to_color(&button.rgba())));
        });

        let handler = emit.clone();
        self.stroke_color.connect_color_set(move |button| {
            handler(OverlayEdit::StrokeColor(rgba_to_color(&button.rgba())));
        });

        let handler = emit.clone();
        self.stroke_width.connect_value_changed(move |spin| {
            handler(OverlayEdit::StrokeWidth(spin.value()));
        });

        let handler = emit.clone();
        self.align.connect_selected_notify(move |dropdown| {
            let align = usize::try_from(dropdown.selected())
                .ok()
                .and_then(|index| TextAlign::ALL.get(index).copied());
            if let Some(align) = align {
                handler(OverlayEdit::Align(align));
            }
        });

        let handler = emit;
        self.font_weight.connect_value_changed(move |spin| {
            handler(OverlayEdit::FontWeight(spin.value().round() as u16));
        });
    }

    pub(super) fn connect_delete<F>(&self, on_delete: F)
    where
        F: Fn() + 'static,
    {
        self.delete.connect_clicked(move |_| on_delete());
    }
}
