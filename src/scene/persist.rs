//! Flat-file persistence of entity transforms.
//!
//! One line per named entity: `name tx ty tz rx ry rz sx sy sz`,
//! space separated. Lines are matched back by name on load; anything that
//! does not parse is skipped without a diagnostic. Names containing
//! whitespace are not supported by the format.

use crate::scene::components::{Name, TransformComponent};
use crate::scene::Transform;
use glam::Vec3;
use hecs::World;
use std::io::{self, BufRead, BufReader, Write};
use std::path::Path;

pub fn save_transforms<W: Write>(world: &World, out: &mut W) -> io::Result<()> {
    for (_entity, (name, transform)) in world.query::<(&Name, &TransformComponent)>().iter() {
        if name.0.is_empty() {
            continue;
        }
        let t = transform.0;
        writeln!(
            out,
            "{} {} {} {} {} {} {} {} {} {}",
            name.0,
            t.translation.x,
            t.translation.y,
            t.translation.z,
            t.rotation.x,
            t.rotation.y,
            t.rotation.z,
            t.scale.x,
            t.scale.y,
            t.scale.z,
        )?;
    }
    Ok(())
}

pub fn load_transforms<R: BufRead>(world: &mut World, input: R) {
    for line in input.lines() {
        let Ok(line) = line else {
            break;
        };
        let Some((name, transform)) = parse_line(&line) else {
            continue;
        };
        apply_by_name(world, name, transform);
    }
}

pub fn save_to_path(world: &World, path: &Path) {
    match std::fs::File::create(path) {
        Ok(mut file) => {
            if let Err(err) = save_transforms(world, &mut file) {
                log::warn!("Failed to write transforms to {:?}: {}", path, err);
            }
        }
        Err(err) => log::warn!("Failed to create {:?}: {}", path, err),
    }
}

pub fn load_from_path(world: &mut World, path: &Path) {
    match std::fs::File::open(path) {
        Ok(file) => load_transforms(world, BufReader::new(file)),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            log::info!("No saved transforms at {:?}", path);
        }
        Err(err) => log::warn!("Failed to open {:?}: {}", path, err),
    }
}

fn parse_line(line: &str) -> Option<(&str, Transform)> {
    let mut parts = line.split_whitespace();
    let name = parts.next()?;

    let mut values = [0f32; 9];
    for value in values.iter_mut() {
        *value = parts.next()?.parse().ok()?;
    }

    Some((
        name,
        Transform::from_trs(
            Vec3::new(values[0], values[1], values[2]),
            Vec3::new(values[3], values[4], values[5]),
            Vec3::new(values[6], values[7], values[8]),
        ),
    ))
}

/// First entity whose name matches wins, like the original load order.
fn apply_by_name(world: &mut World, name: &str, transform: Transform) {
    let mut target = None;
    for (entity, entity_name) in world.query::<&Name>().iter() {
        if entity_name.0 == name {
            target = Some(entity);
            break;
        }
    }
    if let Some(entity) = target {
        if let Ok(mut component) = world.get::<&mut TransformComponent>(entity) {
            component.0 = transform;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn spawn_named(world: &mut World, name: &str, transform: Transform) -> hecs::Entity {
        world.spawn((Name::new(name), TransformComponent(transform)))
    }

    fn transform_of(world: &World, entity: hecs::Entity) -> Transform {
        world.get::<&TransformComponent>(entity).unwrap().0
    }

    #[test]
    fn round_trip_restores_transforms() {
        let mut source = World::new();
        let a = Transform::from_trs(
            Vec3::new(1.0, 2.0, 3.0),
            Vec3::ZERO,
            Vec3::ONE,
        );
        let b = Transform::from_trs(
            Vec3::new(4.0, 5.0, 6.0),
            Vec3::new(0.1, 0.2, 0.3),
            Vec3::splat(2.0),
        );
        spawn_named(&mut source, "A", a);
        spawn_named(&mut source, "B", b);

        let mut buffer = Vec::new();
        save_transforms(&source, &mut buffer).unwrap();

        let mut fresh = World::new();
        let fresh_a = spawn_named(&mut fresh, "A", Transform::default());
        let fresh_b = spawn_named(&mut fresh, "B", Transform::default());
        load_transforms(&mut fresh, Cursor::new(buffer));

        let got_a = transform_of(&fresh, fresh_a);
        let got_b = transform_of(&fresh, fresh_b);
        assert!(got_a.translation.abs_diff_eq(a.translation, 1e-6));
        assert!(got_b.translation.abs_diff_eq(b.translation, 1e-6));
        assert!(got_b.rotation.abs_diff_eq(b.rotation, 1e-6));
        assert!(got_b.scale.abs_diff_eq(b.scale, 1e-6));
    }

    #[test]
    fn unnamed_entities_are_not_saved() {
        let mut world = World::new();
        spawn_named(&mut world, "", Transform::default());
        spawn_named(&mut world, "Kept", Transform::default());

        let mut buffer = Vec::new();
        save_transforms(&world, &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert_eq!(text.lines().count(), 1);
        assert!(text.starts_with("Kept "));
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let mut world = World::new();
        let entity = spawn_named(&mut world, "Plate", Transform::default());

        let input = "\
Plate 1 2\n\
garbage\n\
Plate 7 8 9 0 0 0 1 1 1\n";
        load_transforms(&mut world, Cursor::new(input));

        let got = transform_of(&world, entity);
        assert_eq!(got.translation, Vec3::new(7.0, 8.0, 9.0));
    }

    #[test]
    fn unmatched_names_are_ignored() {
        let mut world = World::new();
        let entity = spawn_named(&mut world, "Floor", Transform::default());

        load_transforms(&mut world, Cursor::new("Ghost 1 2 3 0 0 0 1 1 1\n"));
        assert_eq!(transform_of(&world, entity), Transform::default());
    }
}
