//! Grid storage and occupancy query tests
//!
//! Test categories:
//! - Bounds handling
//! - Place / clear round trips
//! - Two-phase removal
//! - Row compaction

use tetrispace::test_helpers::*;
use tetrispace::{Cell, EngineConfig, Grid, ShapeKind};

fn compact_grid() -> Grid {
    Grid::from_config(&EngineConfig::compact())
}

// ============================================================================
// Bounds
// ============================================================================

mod bounds {
    use super::*;

    #[test]
    fn cells_outside_the_grid_are_occupied() {
        let grid = compact_grid();
        for (x, y) in [(-1, 0), (4, 0), (0, -1), (0, 5), (-3, -3), (100, 2)] {
            assert!(grid.is_occupied(x, y), "({x}, {y}) should be blocked");
        }
    }

    #[test]
    fn empty_cells_inside_the_grid_are_free() {
        let grid = compact_grid();
        for y in 0..5 {
            for x in 0..4 {
                assert!(!grid.is_occupied(x, y));
            }
        }
    }

    #[test]
    fn place_outside_the_grid_is_rejected() {
        let mut grid = compact_grid();
        let id = grid.spawn_occupant(ShapeKind::I);

        assert!(!grid.place(4, 0, id));
        assert_eq!(grid.occupant(id).and_then(|o| o.cell), None);
    }

    #[test]
    fn clear_outside_the_grid_is_a_no_op() {
        let mut grid = compact_grid();
        fill_cells(&mut grid, &[(0, 0)]);

        assert_eq!(grid.clear(-1, 0), None);
        assert!(grid.is_occupied(0, 0));
    }
}

// ============================================================================
// Place / Clear
// ============================================================================

mod place_and_clear {
    use super::*;

    #[test]
    fn place_then_clear_round_trips() {
        let mut grid = compact_grid();
        let id = grid.spawn_occupant(ShapeKind::T);

        assert!(!grid.is_occupied(2, 3));
        assert!(grid.place(2, 3, id));
        assert!(grid.is_occupied(2, 3));

        assert_eq!(grid.clear(2, 3), Some(id));
        assert!(!grid.is_occupied(2, 3));
        assert_eq!(grid.occupant_count(), 0);
    }

    #[test]
    fn unplaced_occupant_blocks_nothing() {
        let mut grid = compact_grid();
        grid.spawn_occupant(ShapeKind::O);

        assert_eq!(grid.filled_count_in_row(0), 0);
        assert_eq!(grid.occupant_count(), 1);
    }

    #[test]
    fn place_sets_world_position_and_lock() {
        let config = EngineConfig {
            cell_size: 2.0,
            origin_x: 10.0,
            ..EngineConfig::compact()
        };
        let mut grid = Grid::from_config(&config);
        let id = grid.spawn_occupant(ShapeKind::S);
        grid.place(1, 2, id);

        let occupant = grid.occupant(id).unwrap();
        assert!(occupant.locked);
        assert_eq!(occupant.cell, Some(Cell::new(1, 2)));
        assert_eq!(occupant.world.x, 12.0);
        assert_eq!(occupant.world.y, 4.0);
    }

    #[test]
    fn overwrite_keeps_last_write() {
        let mut grid = compact_grid();
        let first = grid.spawn_occupant(ShapeKind::T);
        let second = grid.spawn_occupant(ShapeKind::Z);

        grid.place(1, 1, first);
        assert!(grid.place(1, 1, second));

        assert_eq!(grid.occupant_at(1, 1).map(|o| o.id), Some(second));
        assert!(grid.occupant(first).is_none());
        assert_eq!(grid.occupant_count(), 1);
    }

    #[test]
    fn placing_again_moves_the_occupant() {
        let mut grid = compact_grid();
        let id = grid.spawn_occupant(ShapeKind::L);

        grid.place(0, 0, id);
        grid.place(3, 4, id);

        assert!(!grid.is_occupied(0, 0));
        assert!(grid.is_occupied(3, 4));
        assert_eq!(grid.occupant(id).unwrap().cell, Some(Cell::new(3, 4)));
    }

    #[test]
    fn reset_empties_everything() {
        let mut grid = compact_grid();
        let ids = fill_row(&mut grid, 0);
        fill_cells(&mut grid, &[(2, 3)]);
        grid.mark_for_removal(ids[0]);

        grid.reset();

        assert_eq!(grid.occupant_count(), 0);
        assert_eq!(grid.pending_count(), 0);
        assert!(grid.rows().iter().flatten().all(Option::is_none));
    }
}

// ============================================================================
// Two-Phase Removal
// ============================================================================

mod removal {
    use super::*;

    #[test]
    fn pending_occupant_is_not_occupying() {
        let mut grid = compact_grid();
        let ids = fill_cells(&mut grid, &[(1, 1)]);

        assert!(grid.mark_for_removal(ids[0]));

        assert!(!grid.is_occupied(1, 1));
        assert!(grid.occupant_at(1, 1).is_none());
        assert!(grid.is_pending(ids[0]));
        // Still alive until the commit.
        assert_eq!(grid.occupant_count(), 1);
        assert!(!grid.occupant(ids[0]).unwrap().locked);
    }

    #[test]
    fn marking_twice_is_rejected() {
        let mut grid = compact_grid();
        let ids = fill_cells(&mut grid, &[(1, 1)]);

        assert!(grid.mark_for_removal(ids[0]));
        assert!(!grid.mark_for_removal(ids[0]));
        assert_eq!(grid.pending_count(), 1);
        assert_eq!(grid.commit_removals(), 1);
    }

    #[test]
    fn commit_destroys_pending_only() {
        let mut grid = compact_grid();
        let ids = fill_cells(&mut grid, &[(0, 0), (1, 0), (2, 2)]);
        grid.mark_for_removal(ids[0]);
        grid.mark_for_removal(ids[1]);

        assert_eq!(grid.commit_removals(), 2);

        assert_eq!(grid.pending_count(), 0);
        assert_eq!(grid.occupant_count(), 1);
        assert!(grid.is_occupied(2, 2));
    }

    #[test]
    fn clearing_a_pending_cell_defers_destruction() {
        let mut grid = compact_grid();
        let id = grid.spawn_occupant(ShapeKind::I);
        grid.place(0, 0, id);
        grid.mark_for_removal(id);
        // Cell already freed by the mark.
        assert_eq!(grid.clear(0, 0), None);
        assert!(grid.occupant(id).is_some());

        grid.commit_removals();
        assert!(grid.occupant(id).is_none());
    }
}

// ============================================================================
// Compaction
// ============================================================================

mod compaction {
    use super::*;

    fn clear_rows(grid: &mut Grid, rows: &[usize]) {
        for &y in rows {
            for x in 0..grid.width() as i32 {
                if let Some(id) = grid.occupant_at(x, y as i32).map(|o| o.id) {
                    grid.mark_for_removal(id);
                }
            }
        }
        grid.commit_removals();
        grid.compact(rows);
    }

    #[test]
    fn rows_above_a_single_clear_drop_one() {
        let mut grid = compact_grid();
        fill_row(&mut grid, 0);
        let marker = fill_cells(&mut grid, &[(3, 2)])[0];

        clear_rows(&mut grid, &[0]);

        assert_eq!(grid.occupant(marker).unwrap().cell, Some(Cell::new(3, 1)));
        assert_eq!(grid.occupant(marker).unwrap().world.y, 1.0);
        assert!(!grid.is_occupied(3, 2));
    }

    #[test]
    fn non_contiguous_clears_shift_by_rows_below() {
        let mut grid = compact_grid();
        fill_row(&mut grid, 1);
        fill_row(&mut grid, 3);
        let ids = fill_cells(&mut grid, &[(2, 0), (0, 2), (1, 4)]);

        clear_rows(&mut grid, &[1, 3]);

        assert_eq!(grid.occupant(ids[0]).unwrap().cell, Some(Cell::new(2, 0)));
        assert_eq!(grid.occupant(ids[1]).unwrap().cell, Some(Cell::new(0, 1)));
        assert_eq!(grid.occupant(ids[2]).unwrap().cell, Some(Cell::new(1, 2)));
        assert_eq!(grid.occupant(ids[2]).unwrap().world.y, 2.0);
        assert_eq!(grid.occupant_count(), 3);
        assert_eq!(grid.filled_count_in_row(3), 0);
        assert_eq!(grid.filled_count_in_row(4), 0);
    }

    #[test]
    fn contiguous_clears_shift_by_block_height() {
        let mut grid = compact_grid();
        fill_row(&mut grid, 0);
        fill_row(&mut grid, 1);
        let marker = fill_cells(&mut grid, &[(1, 2)])[0];

        clear_rows(&mut grid, &[0, 1]);

        assert_eq!(grid.occupant(marker).unwrap().cell, Some(Cell::new(1, 0)));
        assert!(grid.is_occupied(1, 0));
    }

    #[test]
    fn compact_without_rows_changes_nothing() {
        let mut grid = compact_grid();
        let ids = fill_cells(&mut grid, &[(1, 3)]);

        grid.compact(&[]);

        assert_eq!(grid.occupant(ids[0]).unwrap().cell, Some(Cell::new(1, 3)));
    }
}
