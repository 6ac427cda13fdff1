//! Per-symbol records: declarations, definition and callers

use serde::{Deserialize, Serialize};

use crate::encoding::schema::{caller, info, location};
use crate::encoding::{Builder, Offset, Table};
use crate::error::Result;
use crate::id::SymbolId;

use super::location::{Caller, CallerView, Location, LocationView};

/// Everything known about one symbol within a file.
///
/// The ID is fixed at creation. Declarations and callers accumulate in
/// arrival order; the definition is replaced by every newer one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Info {
    id: SymbolId,
    decls: Vec<Location>,
    def: Option<Location>,
    callers: Vec<Caller>,
}

impl Info {
    pub fn new(id: SymbolId) -> Self {
        Self {
            id,
            decls: Vec::new(),
            def: None,
            callers: Vec::new(),
        }
    }

    pub fn id(&self) -> SymbolId {
        self.id
    }

    pub fn decls(&self) -> &[Location] {
        &self.decls
    }

    pub fn def(&self) -> Option<&Location> {
        self.def.as_ref()
    }

    pub fn callers(&self) -> &[Caller] {
        &self.callers
    }

    pub(crate) fn push_decl(&mut self, loc: Location) {
        self.decls.push(loc);
    }

    pub(crate) fn set_def(&mut self, def: Location) {
        self.def = Some(def);
    }

    pub(crate) fn push_caller(&mut self, caller: Caller) {
        self.callers.push(caller);
    }

    pub(crate) fn encode(&self, builder: &mut Builder) -> Offset {
        let id = builder.create_string(&self.id.to_hex());

        let decls = if self.decls.is_empty() {
            None
        } else {
            let offsets: Vec<Offset> = self.decls.iter().map(|d| d.encode(builder)).collect();
            Some(builder.create_vector(&offsets))
        };

        let def = self.def.as_ref().map(|d| d.encode(builder));

        let callers = if self.callers.is_empty() {
            None
        } else {
            let offsets: Vec<Offset> = self.callers.iter().map(|c| c.encode(builder)).collect();
            Some(builder.create_vector(&offsets))
        };

        builder.start_table(info::FIELD_COUNT);
        builder.add_offset(info::ID, id);
        if let Some(decls) = decls {
            builder.add_offset(info::DECLS, decls);
        }
        if let Some(def) = def {
            builder.add_offset(info::DEF, def);
        }
        if let Some(callers) = callers {
            builder.add_offset(info::CALLERS, callers);
        }
        builder.end_table()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct InfoView<'a> {
    table: Table<'a>,
}

impl<'a> InfoView<'a> {
    pub(crate) fn new(table: Table<'a>) -> Self {
        Self { table }
    }

    /// Hex form of the ID exactly as stored
    pub fn raw_id(&self) -> Result<&'a str> {
        self.table.required_str(info::ID, "ID")
    }

    pub fn id(&self) -> Result<SymbolId> {
        SymbolId::from_hex(self.raw_id()?)
    }

    pub fn decls(&self) -> Result<Vec<LocationView<'a>>> {
        match self.table.get_vector(info::DECLS)? {
            Some(vector) => Ok(vector
                .tables(location::TABLE)?
                .into_iter()
                .map(LocationView::new)
                .collect()),
            None => Ok(Vec::new()),
        }
    }

    /// The definition, if one was recorded. A stored all-zero location
    /// counts as no definition.
    pub fn def(&self) -> Result<Option<LocationView<'a>>> {
        match self.table.get_table(info::DEF, location::TABLE)? {
            Some(table) => {
                let def = LocationView::new(table);
                Ok(if def.exists()? { Some(def) } else { None })
            }
            None => Ok(None),
        }
    }

    pub fn callers(&self) -> Result<Vec<CallerView<'a>>> {
        match self.table.get_vector(info::CALLERS)? {
            Some(vector) => Ok(vector
                .tables(caller::TABLE)?
                .into_iter()
                .map(CallerView::new)
                .collect()),
            None => Ok(Vec::new()),
        }
    }

    pub fn unmarshal(&self) -> Result<Info> {
        Ok(Info {
            id: self.id()?,
            decls: self
                .decls()?
                .iter()
                .map(LocationView::unmarshal)
                .collect::<Result<_>>()?,
            def: self.def()?.map(|d| d.unmarshal()).transpose()?,
            callers: self
                .callers()?
                .iter()
                .map(CallerView::unmarshal)
                .collect::<Result<_>>()?,
        })
    }
}
