// Copyright 2025 Webmobix Solutions AG
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUTHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Builds the batched formatting requests for one run of results.
//!
//! Every item owns the half-open column pair [2i, 2i+2): the name header is
//! merged across both columns, prices go down the left column and quantities
//! down the right. The planner is pure arithmetic over supplied counts, so
//! formatting always lines up with the value-write layout without a lookup.

use google_sheets4::FieldMask;
use google_sheets4::api::{
    CellData, CellFormat, Color, ColorStyle, GridProperties, GridRange, MergeCellsRequest,
    RepeatCellRequest, Request, SheetProperties, TextFormat, UpdateSheetPropertiesRequest,
};

use crate::layout::tiers::PriceTier;

/// Bounding region reset by [`clear_format_request`]; matches the range the
/// value clear erases.
pub const CLEAR_BOUND_ROWS: i32 = 1000;
pub const CLEAR_BOUND_COLS: i32 = 1000;

const HEADER_FONT_SIZE: i32 = 12;
const DEFAULT_FONT_SIZE: i32 = 10;

/// Half-open grid range on one sheet tab. `None` bounds are unbounded.
fn grid_range(
    sheet_id: i32,
    start_row: Option<i32>,
    end_row: Option<i32>,
    start_col: Option<i32>,
    end_col: Option<i32>,
) -> GridRange {
    GridRange {
        sheet_id: Some(sheet_id),
        start_row_index: start_row,
        end_row_index: end_row,
        start_column_index: start_col,
        end_column_index: end_col,
    }
}

fn rgb(red: f32, green: f32, blue: f32, alpha: f32) -> ColorStyle {
    ColorStyle {
        rgb_color: Some(Color {
            red: Some(red),
            green: Some(green),
            blue: Some(blue),
            alpha: Some(alpha),
        }),
        ..Default::default()
    }
}

/// Default header colors: white text on dark gray.
pub fn header_background() -> ColorStyle {
    rgb(0.26, 0.26, 0.26, 1.0)
}

pub fn header_foreground() -> ColorStyle {
    rgb(1.0, 1.0, 1.0, 1.0)
}

/// One MergeCells request per item, merging row [0,1) across that item's
/// column pair so the name spans both the price and quantity columns.
pub fn header_merge_requests(sheet_id: i32, item_count: usize) -> Vec<Request> {
    let mut requests = Vec::with_capacity(item_count);
    let mut col = 0i32;

    for _ in 0..item_count {
        requests.push(Request {
            merge_cells: Some(MergeCellsRequest {
                range: Some(grid_range(sheet_id, Some(0), Some(1), Some(col), Some(col + 2))),
                merge_type: Some("MERGE_ROWS".to_string()),
            }),
            ..Default::default()
        });
        col += 2;
    }

    requests
}

/// Styles the header row (bold, centered, given colors) across all item
/// columns and freezes it in place.
pub fn header_style_requests(
    sheet_id: i32,
    item_count: usize,
    background: ColorStyle,
    foreground: ColorStyle,
) -> Vec<Request> {
    let header_row = grid_range(
        sheet_id,
        Some(0),
        Some(1),
        Some(0),
        Some(item_count as i32 * 2),
    );

    let repeat_cell = Request {
        repeat_cell: Some(RepeatCellRequest {
            range: Some(header_row),
            cell: Some(CellData {
                user_entered_format: Some(CellFormat {
                    background_color_style: Some(background),
                    horizontal_alignment: Some("CENTER".to_string()),
                    text_format: Some(TextFormat {
                        foreground_color_style: Some(foreground),
                        font_size: Some(HEADER_FONT_SIZE),
                        bold: Some(true),
                        ..Default::default()
                    }),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            fields: Some(FieldMask::new(&[
                "userEnteredFormat.backgroundColorStyle",
                "userEnteredFormat.horizontalAlignment",
                "userEnteredFormat.textFormat",
            ])),
        }),
        ..Default::default()
    };

    let frozen_row = Request {
        update_sheet_properties: Some(UpdateSheetPropertiesRequest {
            properties: Some(SheetProperties {
                sheet_id: Some(sheet_id),
                grid_properties: Some(GridProperties {
                    frozen_row_count: Some(1),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            fields: Some(FieldMask::new(&["gridProperties.frozenRowCount"])),
        }),
        ..Default::default()
    };

    vec![repeat_cell, frozen_row]
}

/// One single-cell RepeatCell request per observed price, coloring the price
/// cell with its tier's background. Item j's prices live in column 2j, rows
/// 1.. (row 0 is the header); the text format is left untouched.
pub fn tier_color_requests(sheet_id: i32, tiers_by_item: &[Vec<PriceTier>]) -> Vec<Request> {
    let mut requests = Vec::new();

    for (item_index, tiers) in tiers_by_item.iter().enumerate() {
        let col = item_index as i32 * 2;
        for (price_index, tier) in tiers.iter().enumerate() {
            let row = price_index as i32 + 1;
            requests.push(Request {
                repeat_cell: Some(RepeatCellRequest {
                    range: Some(grid_range(
                        sheet_id,
                        Some(row),
                        Some(row + 1),
                        Some(col),
                        Some(col + 1),
                    )),
                    cell: Some(CellData {
                        user_entered_format: Some(CellFormat {
                            background_color_style: Some(tier.color_style()),
                            ..Default::default()
                        }),
                        ..Default::default()
                    }),
                    fields: Some(FieldMask::new(&["userEnteredFormat.backgroundColorStyle"])),
                }),
                ..Default::default()
            });
        }
    }

    requests
}

/// Resets cell-level formatting over the bounded region a previous run could
/// have touched: white background, black text, default font, not bold.
pub fn clear_format_request(sheet_id: i32) -> Request {
    Request {
        repeat_cell: Some(RepeatCellRequest {
            range: Some(grid_range(
                sheet_id,
                Some(0),
                Some(CLEAR_BOUND_ROWS),
                Some(0),
                Some(CLEAR_BOUND_COLS),
            )),
            cell: Some(CellData {
                user_entered_format: Some(CellFormat {
                    background_color_style: Some(rgb(1.0, 1.0, 1.0, 1.0)),
                    text_format: Some(TextFormat {
                        foreground_color_style: Some(rgb(0.0, 0.0, 0.0, 0.0)),
                        font_size: Some(DEFAULT_FONT_SIZE),
                        bold: Some(false),
                        ..Default::default()
                    }),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            fields: Some(FieldMask::new(&[
                "userEnteredFormat.backgroundColorStyle",
                "userEnteredFormat.textFormat",
            ])),
        }),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range_of(request: &Request) -> &GridRange {
        request
            .repeat_cell
            .as_ref()
            .map(|r| r.range.as_ref().unwrap())
            .or_else(|| {
                request
                    .merge_cells
                    .as_ref()
                    .map(|m| m.range.as_ref().unwrap())
            })
            .expect("request has no range")
    }

    fn bounds(range: &GridRange) -> (i32, i32, i32, i32) {
        (
            range.start_row_index.unwrap(),
            range.end_row_index.unwrap(),
            range.start_column_index.unwrap(),
            range.end_column_index.unwrap(),
        )
    }

    #[test]
    fn merges_one_column_pair_per_item() {
        let requests = header_merge_requests(0, 3);
        assert_eq!(requests.len(), 3);

        let expected_cols = [(0, 2), (2, 4), (4, 6)];
        for (request, (start_col, end_col)) in requests.iter().zip(expected_cols) {
            let merge = request.merge_cells.as_ref().unwrap();
            assert_eq!(merge.merge_type.as_deref(), Some("MERGE_ROWS"));
            assert_eq!(bounds(range_of(request)), (0, 1, start_col, end_col));
        }
    }

    #[test]
    fn merge_ranges_never_overlap() {
        let requests = header_merge_requests(4, 10);
        for pair in requests.windows(2) {
            let first = range_of(&pair[0]);
            let second = range_of(&pair[1]);
            assert_eq!(first.end_column_index, second.start_column_index);
        }
    }

    #[test]
    fn header_style_spans_all_item_columns_and_freezes_the_row() {
        let requests =
            header_style_requests(7, 5, header_background(), header_foreground());
        assert_eq!(requests.len(), 2);

        let repeat = requests[0].repeat_cell.as_ref().unwrap();
        assert_eq!(bounds(repeat.range.as_ref().unwrap()), (0, 1, 0, 10));

        let format = repeat
            .cell
            .as_ref()
            .unwrap()
            .user_entered_format
            .as_ref()
            .unwrap();
        assert_eq!(format.horizontal_alignment.as_deref(), Some("CENTER"));
        let text = format.text_format.as_ref().unwrap();
        assert_eq!(text.bold, Some(true));
        assert_eq!(text.font_size, Some(12));

        let frozen = requests[1].update_sheet_properties.as_ref().unwrap();
        let properties = frozen.properties.as_ref().unwrap();
        assert_eq!(properties.sheet_id, Some(7));
        assert_eq!(
            properties
                .grid_properties
                .as_ref()
                .unwrap()
                .frozen_row_count,
            Some(1)
        );
    }

    #[test]
    fn colors_each_price_cell_below_the_header() {
        let tiers = vec![
            vec![PriceTier::A, PriceTier::C],
            vec![PriceTier::F, PriceTier::B],
        ];
        let requests = tier_color_requests(0, &tiers);
        assert_eq!(requests.len(), 4);

        let expected = [(1, 2, 0, 1), (2, 3, 0, 1), (1, 2, 2, 3), (2, 3, 2, 3)];
        for (request, expected_bounds) in requests.iter().zip(expected) {
            assert_eq!(bounds(range_of(request)), expected_bounds);

            // Tier coloring must not override the cell's text format.
            let repeat = request.repeat_cell.as_ref().unwrap();
            let format = repeat
                .cell
                .as_ref()
                .unwrap()
                .user_entered_format
                .as_ref()
                .unwrap();
            assert!(format.text_format.is_none());
            assert!(format.background_color_style.is_some());
        }
    }

    #[test]
    fn no_items_means_no_requests() {
        assert!(header_merge_requests(0, 0).is_empty());
        assert!(tier_color_requests(0, &[]).is_empty());
    }

    #[test]
    fn clear_format_resets_the_bounded_region() {
        let request = clear_format_request(3);
        assert_eq!(bounds(range_of(&request)), (0, 1000, 0, 1000));

        let repeat = request.repeat_cell.as_ref().unwrap();
        let text = repeat
            .cell
            .as_ref()
            .unwrap()
            .user_entered_format
            .as_ref()
            .unwrap()
            .text_format
            .as_ref()
            .unwrap();
        assert_eq!(text.bold, Some(false));
        assert_eq!(text.font_size, Some(10));
    }
}
