use std::{
    ffi::OsStr,
    path::{Component, Path, PathBuf},
};

/// Derives the output path for a source document.
///
/// The last directory component named `input_area` is replaced with
/// `output_area`, and the extension is replaced with `extension`. The file
/// name itself is never treated as an area name.
///
/// # Examples
///
/// ```
/// use std::path::Path;
///
/// use reqtract::storage::output_path;
///
/// let output = output_path(Path::new("input/RTEMS_SRS.pdf"), "input", "output", "txt");
/// assert_eq!(output, Path::new("output/RTEMS_SRS.txt"));
/// ```
#[must_use]
pub fn output_path(input: &Path, input_area: &str, output_area: &str, extension: &str) -> PathBuf {
    let components: Vec<Component<'_>> = input.components().collect();
    let directories = components.len().saturating_sub(1);

    let area = components[..directories].iter().rposition(
        |component| matches!(component, Component::Normal(name) if *name == OsStr::new(input_area)),
    );

    let mut path = PathBuf::new();
    for (index, component) in components.iter().enumerate() {
        if Some(index) == area {
            path.push(output_area);
        } else {
            path.push(component.as_os_str());
        }
    }
    path.set_extension(extension);
    path
}
