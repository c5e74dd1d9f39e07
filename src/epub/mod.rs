//! EPUB package parsing (container.xml and the OPF package document).

mod parser;

pub use parser::{
    ManifestItem, PackageDocument, local_name, parse_container_xml, parse_opf, resolve_entity,
    resolve_path,
};
