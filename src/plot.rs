//! Declarative layered plot specifications
//!
//! A [`PlotSpec`] binds a source table to visual channels through an
//! [`Encoding`] and lists the [`Layer`]s to draw, in order: later layers draw
//! over earlier ones. Nothing here draws; a [`Renderer`] receives a validated
//! spec and does the drawing.
//!
//! ```
//! use tallyrs::plot::{Encoding, Geom, Layer, PlotSpec};
//! use tallyrs::{val, FieldType, Schema, Table};
//!
//! let schema = Schema::from_pairs(&[("weight", FieldType::Float), ("hindfoot", FieldType::Float)]).unwrap();
//! let table = Table::from_rows(schema, vec![vec![val(40.0), val(31.0)]]).unwrap();
//! let spec = PlotSpec::new(table, Encoding::new().x("weight").y("hindfoot"))
//!     .layer(Layer::new(Geom::Point).alpha(0.1).jitter(0.2, 0.0));
//! assert!(spec.validate().is_ok());
//! ```

use std::collections::BTreeMap;
use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::{Error, Result};
use crate::io::json::to_json_records;
use crate::table::Table;
use crate::value::Value;

/// A visual channel a field can be bound to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    X,
    Y,
    Color,
    Fill,
    Size,
    Shape,
    Alpha,
    Group,
}

impl Channel {
    pub fn name(self) -> &'static str {
        match self {
            Channel::X => "x",
            Channel::Y => "y",
            Channel::Color => "color",
            Channel::Fill => "fill",
            Channel::Size => "size",
            Channel::Shape => "shape",
            Channel::Alpha => "alpha",
            Channel::Group => "group",
        }
    }
}

impl Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Field-to-channel bindings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Encoding {
    bindings: BTreeMap<Channel, String>,
}

impl Encoding {
    pub fn new() -> Self {
        Encoding::default()
    }

    /// Bind `field` to `channel`, replacing any previous binding
    pub fn bind(mut self, channel: Channel, field: impl Into<String>) -> Self {
        self.bindings.insert(channel, field.into());
        self
    }

    pub fn x(self, field: impl Into<String>) -> Self {
        self.bind(Channel::X, field)
    }

    pub fn y(self, field: impl Into<String>) -> Self {
        self.bind(Channel::Y, field)
    }

    pub fn color(self, field: impl Into<String>) -> Self {
        self.bind(Channel::Color, field)
    }

    pub fn fill(self, field: impl Into<String>) -> Self {
        self.bind(Channel::Fill, field)
    }

    pub fn size(self, field: impl Into<String>) -> Self {
        self.bind(Channel::Size, field)
    }

    pub fn group(self, field: impl Into<String>) -> Self {
        self.bind(Channel::Group, field)
    }

    pub fn get(&self, channel: Channel) -> Option<&str> {
        self.bindings.get(&channel).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Channel, &str)> {
        self.bindings.iter().map(|(c, f)| (*c, f.as_str()))
    }

    /// `self` with every binding in `overrides` applied on top
    pub fn merged(&self, overrides: &Encoding) -> Encoding {
        let mut bindings = self.bindings.clone();
        for (channel, field) in &overrides.bindings {
            bindings.insert(*channel, field.clone());
        }
        Encoding { bindings }
    }
}

/// Visual geometry of a layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Geom {
    Point,
    Line,
    Bar,
    Boxplot,
    Histogram,
}

impl Geom {
    /// Channels a layer of this geometry cannot be drawn without
    pub fn required_channels(self) -> &'static [Channel] {
        match self {
            Geom::Point | Geom::Line | Geom::Boxplot => &[Channel::X, Channel::Y],
            Geom::Bar | Geom::Histogram => &[Channel::X],
        }
    }
}

/// Random displacement applied to marks to reduce overplotting
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Jitter {
    pub width: f64,
    pub height: f64,
}

/// Constant per-layer style overrides
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayerStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alpha: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jitter: Option<Jitter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl LayerStyle {
    fn validate(&self, layer: usize) -> Result<()> {
        if let Some(alpha) = self.alpha {
            if !(0.0..=1.0).contains(&alpha) {
                return Err(Error::InvalidArgument(format!(
                    "layer {}: alpha must be within [0, 1], got {}",
                    layer, alpha
                )));
            }
        }
        if let Some(jitter) = self.jitter {
            let ok = |v: f64| v.is_finite() && v >= 0.0;
            if !ok(jitter.width) || !ok(jitter.height) {
                return Err(Error::InvalidArgument(format!(
                    "layer {}: jitter must be finite and non-negative",
                    layer
                )));
            }
        }
        if let Some(size) = self.size {
            if !(size.is_finite() && size > 0.0) {
                return Err(Error::InvalidArgument(format!(
                    "layer {}: size must be positive, got {}",
                    layer, size
                )));
            }
        }
        Ok(())
    }
}

/// One geometry drawn from the plot data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    pub geom: Geom,
    /// Bindings that replace the plot-level encoding for this layer only
    #[serde(default, skip_serializing_if = "Encoding::is_empty")]
    pub encoding: Encoding,
    #[serde(default)]
    pub style: LayerStyle,
}

impl Layer {
    pub fn new(geom: Geom) -> Self {
        Layer {
            geom,
            encoding: Encoding::new(),
            style: LayerStyle::default(),
        }
    }

    pub fn encode(mut self, channel: Channel, field: impl Into<String>) -> Self {
        self.encoding = self.encoding.bind(channel, field);
        self
    }

    pub fn alpha(mut self, alpha: f64) -> Self {
        self.style.alpha = Some(alpha);
        self
    }

    pub fn jitter(mut self, width: f64, height: f64) -> Self {
        self.style.jitter = Some(Jitter { width, height });
        self
    }

    pub fn size(mut self, size: f64) -> Self {
        self.style.size = Some(size);
        self
    }

    pub fn color(mut self, color: impl Into<String>) -> Self {
        self.style.color = Some(color.into());
        self
    }
}

/// One visual mark: the channel values of a single record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Mark {
    pub row: usize,
    pub channels: BTreeMap<Channel, Value>,
}

/// Source data, shared encoding, and ordered layers
#[derive(Debug, Clone, PartialEq)]
pub struct PlotSpec {
    data: Table,
    encoding: Encoding,
    layers: Vec<Layer>,
    title: Option<String>,
    labels: BTreeMap<Channel, String>,
}

impl PlotSpec {
    pub fn new(data: Table, encoding: Encoding) -> Self {
        PlotSpec {
            data,
            encoding,
            layers: Vec::new(),
            title: None,
            labels: BTreeMap::new(),
        }
    }

    /// Add a layer on top of the existing ones
    pub fn layer(mut self, layer: Layer) -> Self {
        self.layers.push(layer);
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Axis or legend label for a channel
    pub fn label(mut self, channel: Channel, label: impl Into<String>) -> Self {
        self.labels.insert(channel, label.into());
        self
    }

    pub fn data(&self) -> &Table {
        &self.data
    }

    pub fn encoding(&self) -> &Encoding {
        &self.encoding
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Plot-level encoding with the layer's overrides applied
    pub fn resolved_encoding(&self, layer: usize) -> Result<Encoding> {
        let l = self.layers.get(layer).ok_or_else(|| {
            Error::InvalidArgument(format!(
                "layer {} out of range ({} layers)",
                layer,
                self.layers.len()
            ))
        })?;
        Ok(self.encoding.merged(&l.encoding))
    }

    /// Check that the plot can be drawn
    pub fn validate(&self) -> Result<()> {
        if self.layers.is_empty() {
            return Err(Error::InvalidArgument(
                "plot needs at least one layer".to_string(),
            ));
        }
        let schema = self.data.schema();
        for (_, field) in self.encoding.iter() {
            schema.index_of(field)?;
        }
        for (i, layer) in self.layers.iter().enumerate() {
            let encoding = self.encoding.merged(&layer.encoding);
            for (_, field) in encoding.iter() {
                schema.index_of(field)?;
            }
            for &channel in layer.geom.required_channels() {
                if encoding.get(channel).is_none() {
                    return Err(Error::InvalidArgument(format!(
                        "layer {} ({:?}) needs a binding for channel '{}'",
                        i, layer.geom, channel
                    )));
                }
            }
            layer.style.validate(i)?;
        }
        Ok(())
    }

    /// One mark per record of the data, for the given layer
    pub fn marks(&self, layer: usize) -> Result<Vec<Mark>> {
        let encoding = self.resolved_encoding(layer)?;
        let bound = encoding
            .iter()
            .map(|(channel, field)| Ok((channel, self.data.schema().index_of(field)?)))
            .collect::<Result<Vec<_>>>()?;
        Ok(self
            .data
            .records()
            .iter()
            .enumerate()
            .map(|(row, record)| Mark {
                row,
                channels: bound
                    .iter()
                    .map(|&(channel, idx)| (channel, record.values()[idx].clone()))
                    .collect(),
            })
            .collect())
    }

    /// Serialize the validated spec for a renderer
    pub fn to_json(&self) -> Result<serde_json::Value> {
        self.validate()?;
        Ok(json!({
            "title": self.title,
            "labels": self.labels,
            "data": to_json_records(&self.data),
            "encoding": self.encoding,
            "layers": self.layers,
        }))
    }

    /// Validate, then hand the plot to `renderer`
    pub fn render<R: Renderer + ?Sized>(&self, renderer: &mut R) -> Result<()> {
        self.validate()?;
        log::debug!(
            "rendering {} layers over {} records",
            self.layers.len(),
            self.data.row_count()
        );
        renderer.render(self)
    }
}

/// A drawing backend that consumes validated plot specs
pub trait Renderer {
    fn render(&mut self, spec: &PlotSpec) -> Result<()>;
}
