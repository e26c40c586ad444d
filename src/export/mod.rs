/// Export of sliced tiles as a single zip bundle

pub mod bundle;
