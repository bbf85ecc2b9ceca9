//! Renders a session snapshot: thumbnail strip, preview pane and action bar
use iced::widget::image::{Handle, Image};
use iced::widget::scrollable::{Direction, Scrollbar};
use iced::widget::{button, column, container, image, row, scrollable, text, Column, Row};
use iced::{Alignment, Element, Length};

use decapod_capture::state::data::{ImageRecord, PreviewMode, Snapshot};
use crate::Message;

const THUMB_WIDTH: f32 = 96.0;

/// Which image the preview pane shows: the compare image while comparing
pub fn preview_target(snapshot: &Snapshot, comparing: bool) -> Option<&str> {
    let view = &snapshot.view;
    if comparing {
        view.compare_image.as_deref().or(view.preview_image.as_deref())
    } else {
        view.preview_image.as_deref()
    }
}

pub fn view<'a>(
    snapshot: &'a Snapshot,
    preview_mode: PreviewMode,
    comparing: bool,
    status: &'a str,
) -> Element<'a, Message> {
    let preview: Element<Message> = match preview_target(snapshot, comparing) {
        Some(path) => {
            let img: Image<Handle> = image(Handle::from_path(path));
            img.width(Length::Fill).height(Length::Fill).into()
        }
        None => text("No images yet. Take a picture to start.").size(20).into(),
    };

    let actions = row![
        button("Take Picture").on_press(Message::TakePicture).padding(10),
        button("Fix Image")
            .on_press_maybe(snapshot.view.fix_enabled.then_some(Message::Fix))
            .padding(10),
        button(if comparing { "Back" } else { "Compare Before/After" })
            .on_press_maybe(snapshot.view.compare_enabled.then_some(Message::Compare))
            .padding(10),
        button(match preview_mode {
            PreviewMode::PreferFixed => "Preview: Fixed",
            PreviewMode::Original => "Preview: Original",
        })
        .on_press(Message::TogglePreviewMode)
        .padding(10),
        button("Open Folder").on_press(Message::OpenFolder).padding(10),
    ]
    .spacing(10);

    let content: Column<Message> = column![
        container(preview)
            .width(Length::Fill)
            .height(Length::Fill)
            .center_x(Length::Fill)
            .center_y(Length::Fill),
        actions,
        thumb_strip(snapshot),
        text(status).size(14),
    ]
    .spacing(16)
    .padding(20)
    .align_x(Alignment::Center);

    container(content)
        .width(Length::Fill)
        .height(Length::Fill)
        .into()
}

fn thumb_strip(snapshot: &Snapshot) -> Element<'_, Message> {
    let items = snapshot
        .records
        .iter()
        .enumerate()
        .map(|(index, record)| thumb_item(index, record, snapshot));

    scrollable(Row::with_children(items).spacing(8).padding(4))
        .direction(Direction::Horizontal(Scrollbar::new()))
        .width(Length::Fill)
        .into()
}

fn thumb_item<'a>(index: usize, record: &'a ImageRecord, snapshot: &'a Snapshot) -> Element<'a, Message> {
    let thumb: Image<Handle> = image(Handle::from_path(&record.thumb_image));
    let mut item = column![thumb.width(THUMB_WIDTH), text((index + 1).to_string()).size(12)]
        .spacing(4)
        .align_x(Alignment::Center);

    // Only the selected thumbnail carries a delete button
    if snapshot.view.delete_affordance == Some(index) {
        item = item.push(button(text("Delete").size(12)).on_press(Message::Delete));
    }

    let tile = button(item).on_press(Message::Select(index)).padding(4);
    if snapshot.selected == Some(index) {
        tile.style(button::primary).into()
    } else {
        tile.style(button::secondary).into()
    }
}
