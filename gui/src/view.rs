use crate::{App, Message};
use iced::font::Weight;
use iced::widget::{button, column, container, row, scrollable, text, text_input, Column, Space};
use iced::{Element, Font, Length, Theme};
use report::{distribution_bar, format_counts, DisplayComment};
use threadmood_core::{Sentiment, Theme as ThemePreference};

const BAR_WIDTH: usize = 24;

pub(crate) fn render(app: &App) -> Element<Message, Theme> {
    let theme_label = match app.preferences().theme {
        ThemePreference::Light => "Dark mode",
        ThemePreference::Dark => "Light mode",
    };
    let header = row![
        text("threadmood").size(24),
        Space::with_width(Length::Fill),
        button(theme_label).on_press(Message::ToggleTheme),
    ]
    .spacing(10);

    let endpoint = row![
        text_input("Classification API URL", app.api_url())
            .on_input(Message::ApiUrlChanged)
            .on_submit(Message::Refresh)
            .padding(8),
        button("Refresh").on_press(Message::Refresh),
    ]
    .spacing(10);

    let exports = row![
        button("Copy CSV").on_press(Message::CopyCsv),
        button("Export CSV").on_press(Message::ExportCsv),
        button("Export HTML").on_press(Message::ExportHtml),
        button("Export metrics").on_press(Message::ExportMetrics),
    ]
    .spacing(10);

    let main_content: Element<Message, Theme> = column![
        header,
        endpoint,
        text(app.status()).size(14),
        stats(app),
        exports,
        scrollable(comment_list(app.comments())).height(Length::Fill),
    ]
    .spacing(16)
    .into();

    container(main_content)
        .width(Length::Fill)
        .height(Length::Fill)
        .padding(20)
        .into()
}

fn stats(app: &App) -> Element<Message, Theme> {
    let counts = app.counts();
    let mut block = Column::new()
        .spacing(4)
        .push(text(format!("Total comments: {}", counts.total)).size(16))
        .push(text(format_counts(&counts)).size(12));

    for sentiment in Sentiment::ALL {
        block = block.push(
            row![
                text(format!("{:<8}", sentiment.label()))
                    .font(Font::MONOSPACE)
                    .size(13),
                text(distribution_bar(&counts, sentiment, BAR_WIDTH))
                    .font(Font::MONOSPACE)
                    .size(13),
                text(format!("{:.0}%", counts.share(sentiment) * 100.0)).size(13),
            ]
            .spacing(8),
        );
    }

    block.into()
}

fn comment_list(comments: &[DisplayComment]) -> Element<Message, Theme> {
    if comments.is_empty() {
        return column![
            text("No comments yet").size(16),
            text("Enter the API URL and press Refresh").size(14)
        ]
        .spacing(10)
        .into();
    }

    let bold = Font {
        weight: Weight::Bold,
        ..Font::DEFAULT
    };

    let mut list = Column::new().spacing(10);
    for comment in comments {
        let mut body = Column::new()
            .spacing(5)
            .push(text(&comment.author).font(bold).size(14))
            .push(text(&comment.text).size(14));

        for reply in &comment.replies {
            body = body.push(container(text(format!("↳ {}", reply)).size(12)).padding([0, 0, 0, 16]));
        }

        body = body.push(
            text(format!(
                "Sentiment: {} | confidence: {}",
                comment.sentiment, comment.confidence
            ))
            .size(12),
        );
        list = list.push(container(body).padding(10));
    }

    list.into()
}
